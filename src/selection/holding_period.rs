//! Fixed holding-period selection policy.

use rust_decimal::Decimal;

use super::threshold::take_profit_reached;
use super::{CloseReason, SelectionPolicy};
use crate::portfolio::PairPosition;

/// Holds every pair for a fixed number of days regardless of score, with an
/// optional take-profit exit. Never rebalances.
#[derive(Debug, Clone)]
pub struct HoldingPeriodPolicy {
    max_holding_days: u32,
    take_profit: Option<Decimal>,
}

impl HoldingPeriodPolicy {
    pub fn new(max_holding_days: u32, take_profit: Option<Decimal>) -> Self {
        Self {
            max_holding_days,
            take_profit,
        }
    }
}

impl SelectionPolicy for HoldingPeriodPolicy {
    fn name(&self) -> &'static str {
        "holding_period"
    }

    fn close_triggers(&self, position: &PairPosition, _score: Option<f64>) -> Vec<CloseReason> {
        let mut triggers = Vec::new();
        if position.holding_days() > self.max_holding_days {
            triggers.push(CloseReason::HoldingPeriod);
        }
        if take_profit_reached(position, self.take_profit) {
            triggers.push(CloseReason::TakeProfit);
        }
        triggers
    }
}
