//! Pairs-trading portfolio simulation.
//!
//! Consumes an aligned daily price feed and a daily score per candidate pair,
//! and simulates a dollar-neutral book of two-leg positions: marking to
//! market, closing on policy triggers, and admitting new pairs greedily under
//! a per-security exposure cap. Output is one [`backtest::DailyRecord`] per
//! date.

pub mod backtest;
pub mod market;
pub mod math;
pub mod metrics;
pub mod observability;
pub mod portfolio;
pub mod risk;
pub mod selection;
pub mod types;

pub use backtest::{
    run_sweep, DailyRecord, EngineError, PolicyKind, PortfolioConstructor, SimulationConfig,
    SimulationReport,
};
pub use market::{DailyPrices, PriceBar, PriceFeed, ScoreFeed};
pub use portfolio::{PairPortfolio, PairPosition};
pub use selection::{CloseReason, SelectionPolicy};
pub use types::{PairId, SecurityId, Side};
