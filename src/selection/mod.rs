//! Pair-selection policies.
//!
//! A `SelectionPolicy` decides which open positions must close and which
//! ranked candidates may open. Close rules differ per variant; candidate
//! ranking and the greedy exposure-constrained admission are shared through
//! default methods.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

use crate::market::DailyPrices;
use crate::portfolio::PairPosition;
use crate::types::{PairId, SecurityId, Side};

pub mod admission;
pub mod holding_period;
pub mod threshold;

pub use admission::{greedy_admission, rank_by_abs_score};
pub use holding_period::HoldingPeriodPolicy;
pub use threshold::ThresholdPolicy;

/// Why a position left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Held longer than the configured maximum.
    HoldingPeriod,
    /// |score| fell below the exit threshold.
    ScoreDecay,
    /// Score sign flipped against the entry side.
    SignReversal,
    /// Cumulative return reached the take-profit fraction.
    TakeProfit,
    /// A leg had no usable price.
    MissingPrice,
    /// Forced liquidation on the last simulated day.
    EndOfHorizon,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoldingPeriod => "holding_period",
            Self::ScoreDecay => "score_decay",
            Self::SignReversal => "sign_reversal",
            Self::TakeProfit => "take_profit",
            Self::MissingPrice => "missing_price",
            Self::EndOfHorizon => "end_of_horizon",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pair eligible to open today.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub pair: PairId,
    pub score: f64,
}

impl Candidate {
    pub fn new(pair: PairId, score: f64) -> Self {
        Self { pair, score }
    }

    pub fn side(&self) -> Option<Side> {
        Side::from_score(self.score)
    }
}

/// Constraints for one day's Open-Evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionLimits {
    /// Max absolute signed leg count per security.
    pub security_cap: i64,
    /// Open slots left before the target pair count is reached.
    pub slots: usize,
    /// Dollars left before the book size is reached.
    pub budget: Decimal,
}

/// A candidate accepted for opening, with its dollar allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub pair: PairId,
    pub side: Side,
    pub gross_dollars: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdmissionOutcome {
    pub admitted: Vec<Admission>,
    /// Candidates skipped because a leg would breach the security cap.
    pub cap_rejections: usize,
    /// Candidates skipped because a leg would round to zero shares.
    pub size_rejections: usize,
}

/// Capability interface for swappable close/open rules.
pub trait SelectionPolicy: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Every close rule that fires for `position` given today's score
    /// (`None` if the pair was not scored today). Empty means keep.
    fn close_triggers(&self, position: &PairPosition, score: Option<f64>) -> Vec<CloseReason>;

    /// Order candidates best first.
    fn rank(&self, candidates: &mut Vec<Candidate>) {
        rank_by_abs_score(candidates);
    }

    /// Accept ranked candidates subject to `limits`, starting from the
    /// signed per-security counts of the open book. Only candidates that can
    /// be opened at `prices` with their allocation count against the limits.
    fn admit(
        &self,
        ranked: &[Candidate],
        counts: &HashMap<SecurityId, i64>,
        prices: &DailyPrices,
        limits: &AdmissionLimits,
    ) -> AdmissionOutcome {
        greedy_admission(ranked, counts, prices, limits)
    }

    /// Whether drifted positions are resized back to target.
    fn rebalance_enabled(&self) -> bool {
        false
    }
}
