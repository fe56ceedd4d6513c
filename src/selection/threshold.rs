//! Score-threshold selection policy.

use rust_decimal::Decimal;

use super::{CloseReason, SelectionPolicy};
use crate::portfolio::PairPosition;

/// Closes on holding period, score decay, sign reversal or take-profit.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    exit_threshold: f64,
    max_holding_days: u32,
    take_profit: Option<Decimal>,
    rebalance: bool,
}

impl ThresholdPolicy {
    pub fn new(exit_threshold: f64, max_holding_days: u32) -> Self {
        Self {
            exit_threshold,
            max_holding_days,
            take_profit: None,
            rebalance: false,
        }
    }

    #[must_use]
    pub fn with_take_profit(mut self, take_profit: Option<Decimal>) -> Self {
        self.take_profit = take_profit;
        self
    }

    #[must_use]
    pub fn with_rebalance(mut self, rebalance: bool) -> Self {
        self.rebalance = rebalance;
        self
    }
}

impl SelectionPolicy for ThresholdPolicy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn close_triggers(&self, position: &PairPosition, score: Option<f64>) -> Vec<CloseReason> {
        let mut triggers = Vec::new();

        if position.holding_days() > self.max_holding_days {
            triggers.push(CloseReason::HoldingPeriod);
        }
        if let Some(score) = score.filter(|s| s.is_finite()) {
            if score.abs() < self.exit_threshold {
                triggers.push(CloseReason::ScoreDecay);
            }
            if position.side().is_reversed_by(score) {
                triggers.push(CloseReason::SignReversal);
            }
        }
        if take_profit_reached(position, self.take_profit) {
            triggers.push(CloseReason::TakeProfit);
        }
        triggers
    }

    fn rebalance_enabled(&self) -> bool {
        self.rebalance
    }
}

pub(super) fn take_profit_reached(position: &PairPosition, take_profit: Option<Decimal>) -> bool {
    match (take_profit, position.return_on_entry()) {
        (Some(target), Some(ret)) => ret >= target,
        _ => false,
    }
}
