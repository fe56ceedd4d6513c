//! Parallel parameter sweeps.
//!
//! Each configuration runs on its own blocking worker against shared,
//! read-only feeds. Runs never share a portfolio.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::config::SimulationConfig;
use super::constructor::PortfolioConstructor;
use super::error::EngineError;
use super::report::SimulationReport;
use crate::market::{PriceFeed, ScoreFeed};

/// Run every configuration and return the results in input order.
pub async fn run_sweep(
    configs: Vec<SimulationConfig>,
    prices: Arc<PriceFeed>,
    scores: Arc<ScoreFeed>,
) -> Vec<Result<SimulationReport, EngineError>> {
    let total = configs.len();
    info!(runs = total, "Starting parameter sweep");

    let mut set = JoinSet::new();
    for (index, config) in configs.into_iter().enumerate() {
        let prices = Arc::clone(&prices);
        let scores = Arc::clone(&scores);
        set.spawn_blocking(move || {
            let result = PortfolioConstructor::from_config(config)
                .and_then(|mut engine| engine.run(&prices, &scores));
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<SimulationReport, EngineError>>> =
        (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!(error = %e, "Sweep worker failed"),
        }
    }

    let results: Vec<_> = slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(EngineError::Worker("worker did not complete".to_string()))))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(runs = total, failed, "Parameter sweep complete");
    results
}
