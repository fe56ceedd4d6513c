//! Daily simulation loop.
//!
//! Each trading day runs four phases in a fixed order:
//!
//! 1. **PriceUpdate** - mark every open position; missing prices force-close
//! 2. **Close-Evaluation** - close positions whose policy triggers fire
//!    (replaced by a forced `close_all` on the last day)
//! 3. **Open-Evaluation** - rank eligible candidates and admit them greedily
//!    under the per-security cap (skipped on the last day)
//! 4. **MetricsCapture** - drain the day's P&L and turnover into a record
//!
//! Closing before prices are marked would attribute the day's move to the
//! wrong position, so the order must not change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use super::config::SimulationConfig;
use super::error::EngineError;
use super::report::{DailyRecord, RunCounters, SimulationReport};
use crate::market::{DailyPrices, PriceFeed, ScoreFeed};
use crate::metrics;
use crate::portfolio::PairPortfolio;
use crate::risk::{ExposureMonitor, ExposureStatus};
use crate::selection::{AdmissionLimits, Candidate, CloseReason, SelectionPolicy};
use crate::types::PairId;

pub struct PortfolioConstructor {
    config: SimulationConfig,
    policy: Box<dyn SelectionPolicy>,
    portfolio: PairPortfolio,
    monitor: ExposureMonitor,
    counters: RunCounters,
}

impl PortfolioConstructor {
    /// Validate `config` and build a constructor around `policy`.
    ///
    /// Fails before any day is simulated if the configuration is invalid.
    pub fn new(config: SimulationConfig, policy: Box<dyn SelectionPolicy>) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let portfolio = PairPortfolio::new(config.commission_per_share);
        let monitor = ExposureMonitor::new(config.book_size, i64::from(config.max_security_exposure));
        Ok(Self {
            config,
            policy,
            portfolio,
            monitor,
            counters: RunCounters::default(),
        })
    }

    /// Build with the policy variant named in `config`.
    pub fn from_config(config: SimulationConfig) -> Result<Self, EngineError> {
        let policy = config.build_policy();
        Self::new(config, policy)
    }

    /// Simulate every date of `prices` in order and return the daily table.
    ///
    /// The portfolio starts empty and the last row always reflects full
    /// liquidation.
    #[instrument(skip_all, fields(policy = self.policy.name(), days = prices.len()))]
    pub fn run(&mut self, prices: &PriceFeed, scores: &ScoreFeed) -> Result<SimulationReport, EngineError> {
        let dates = prices.dates();
        let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
            return Err(EngineError::EmptyHorizon);
        };
        self.reset();

        info!(
            start = %first,
            end = %last,
            book_size = %self.config.book_size,
            target_pairs = self.config.target_pairs,
            security_cap = self.config.max_security_exposure,
            "Starting simulation"
        );

        let no_prices = DailyPrices::new();
        let mut records = Vec::with_capacity(dates.len());
        let mut prev_exposure = Decimal::ZERO;

        for date in dates {
            let day_prices = prices.on(date).unwrap_or(&no_prices);
            let record = self.step(date, day_prices, scores, date == last, prev_exposure)?;
            prev_exposure = record.gross_exposure;
            records.push(record);
        }

        let report = SimulationReport::new(records, self.counters);
        info!(
            total_pl = %report.total_pl(),
            opened = self.counters.opened,
            closed = self.counters.closed,
            missing_price_closes = self.counters.missing_price_closes,
            exposure_warnings = self.counters.exposure_warnings,
            "Simulation complete"
        );
        Ok(report)
    }

    /// Run one trading day through all four phases.
    pub fn step(
        &mut self,
        date: NaiveDate,
        prices: &DailyPrices,
        scores: &ScoreFeed,
        is_last_day: bool,
        prev_exposure: Decimal,
    ) -> Result<DailyRecord, EngineError> {
        // PriceUpdate
        let evicted = self.portfolio.update_prices(prices);
        for pair in &evicted {
            self.record_close(date, pair, CloseReason::MissingPrice);
            self.counters.missing_price_closes += 1;
        }
        let mut closed_today: HashSet<PairId> = evicted.into_iter().collect();

        if is_last_day {
            let ids: Vec<PairId> = self.portfolio.positions().map(|p| p.pair().clone()).collect();
            self.portfolio.close_all();
            for pair in &ids {
                self.record_close(date, pair, CloseReason::EndOfHorizon);
            }
        } else {
            // Close-Evaluation
            closed_today.extend(self.evaluate_closes(date, scores));
            if self.policy.rebalance_enabled() {
                self.rebalance(date);
            }
            // Open-Evaluation
            self.evaluate_opens(date, prices, scores, &closed_today);
            self.monitor
                .check_security_caps(&self.portfolio.security_exposure_counts())?;
        }

        // MetricsCapture
        let gross_exposure = self.portfolio.gross_exposure();
        if self.monitor.check_gross(gross_exposure) == ExposureStatus::Warning {
            self.counters.exposure_warnings += 1;
        }
        let totals = self.portfolio.drain_day();
        metrics::record_simulated_day();

        Ok(DailyRecord::new(date, totals.pl, gross_exposure, totals.turnover, prev_exposure))
    }

    fn evaluate_closes(&mut self, date: NaiveDate, scores: &ScoreFeed) -> Vec<PairId> {
        let today = scores.lookup(date);
        let mut to_close: Vec<(PairId, CloseReason)> = Vec::new();

        for position in self.portfolio.positions() {
            let score = today.get(position.pair()).copied();
            let triggers = self.policy.close_triggers(position, score);
            // One close per position however many rules fire.
            if let Some(reason) = triggers.first().copied() {
                debug!(pair = %position.pair(), ?triggers, ?score, "Close triggered");
                to_close.push((position.pair().clone(), reason));
            }
        }

        self.portfolio.remove_pairs(to_close.iter().map(|(pair, _)| pair));
        for (pair, reason) in &to_close {
            self.record_close(date, pair, *reason);
        }
        to_close.into_iter().map(|(pair, _)| pair).collect()
    }

    fn rebalance(&mut self, date: NaiveDate) {
        let target = self.config.target_pair_exposure();
        let tolerance = target * self.config.rebalance_deviation;
        let drifted: Vec<PairId> = self
            .portfolio
            .positions()
            .filter(|p| (p.exposure() - target).abs() > tolerance)
            .map(|p| p.pair().clone())
            .collect();

        for pair in drifted {
            if self.portfolio.resize_pair(&pair, target) {
                debug!(%date, pair = %pair, target = %target, "Rebalanced pair");
                self.counters.rebalances += 1;
            }
        }
    }

    fn evaluate_opens(
        &mut self,
        date: NaiveDate,
        prices: &DailyPrices,
        scores: &ScoreFeed,
        closed_today: &HashSet<PairId>,
    ) {
        let slots = self.config.target_pairs.saturating_sub(self.portfolio.len());
        let budget = self.config.book_size - self.portfolio.gross_exposure();
        if slots == 0 || budget <= Decimal::ZERO {
            return;
        }

        let mut candidates: Vec<Candidate> = scores
            .on(date)
            .iter()
            .filter(|(pair, score)| {
                score.is_finite()
                    && score.abs() >= self.config.entry_threshold
                    && !self.portfolio.contains(pair)
                    && !closed_today.contains(pair)
                    && prices.has_pair(pair)
            })
            .map(|(pair, score)| Candidate::new(pair.clone(), *score))
            .collect();
        if candidates.is_empty() {
            return;
        }
        self.policy.rank(&mut candidates);

        let limits = AdmissionLimits {
            security_cap: i64::from(self.config.max_security_exposure),
            slots,
            budget,
        };
        let outcome = self.policy.admit(
            &candidates,
            &self.portfolio.security_exposure_counts(),
            prices,
            &limits,
        );
        self.counters.cap_rejections += outcome.cap_rejections;
        self.counters.size_rejections += outcome.size_rejections;
        metrics::record_admission_rejections("security_cap", outcome.cap_rejections);
        metrics::record_admission_rejections("zero_shares", outcome.size_rejections);

        let mut opened = 0;
        for admission in outcome.admitted {
            if self
                .portfolio
                .add_pair(admission.pair, prices, admission.gross_dollars, admission.side)
            {
                opened += 1;
            }
        }
        self.counters.opened += opened;
        metrics::record_opened(opened);
        debug!(
            %date,
            candidates = candidates.len(),
            opened,
            cap_rejections = outcome.cap_rejections,
            size_rejections = outcome.size_rejections,
            open_pairs = self.portfolio.len(),
            "Open-Evaluation complete"
        );
    }

    fn record_close(&mut self, date: NaiveDate, pair: &PairId, reason: CloseReason) {
        debug!(%date, pair = %pair, %reason, "Closed pair");
        self.counters.closed += 1;
        metrics::record_closed(reason.as_str());
    }

    fn reset(&mut self) {
        self.portfolio = PairPortfolio::new(self.config.commission_per_share);
        self.counters = RunCounters::default();
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &PairPortfolio {
        &self.portfolio
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }
}
