//! Candidate ranking and greedy exposure-constrained admission.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

use super::{Admission, AdmissionLimits, AdmissionOutcome, Candidate};
use crate::market::DailyPrices;
use crate::portfolio::{add_leg_counts, can_open_pair};
use crate::types::SecurityId;

/// Stable sort by descending |score|; ties keep feed order.
pub fn rank_by_abs_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.abs().total_cmp(&a.score.abs()));
}

/// Walk `ranked` in order and admit every candidate whose two unit leg
/// deltas keep both securities within `limits.security_cap`.
///
/// A candidate that would breach the cap, or that cannot be opened at
/// `prices` with its allocation, is skipped and the scan continues without
/// consuming a slot, budget or cap headroom. Each admission receives
/// `remaining budget / remaining slots`; the scan stops once slots or budget
/// run out.
pub fn greedy_admission(
    ranked: &[Candidate],
    counts: &HashMap<SecurityId, i64>,
    prices: &DailyPrices,
    limits: &AdmissionLimits,
) -> AdmissionOutcome {
    let mut running = counts.clone();
    let mut slots = limits.slots;
    let mut budget = limits.budget;
    let mut outcome = AdmissionOutcome::default();

    for candidate in ranked {
        if slots == 0 || budget <= Decimal::ZERO {
            break;
        }
        let Some(side) = candidate.side() else {
            continue;
        };

        let sign = side.leg_a_sign();
        let pair = &candidate.pair;
        let next_a = running.get(&pair.leg_a).copied().unwrap_or(0) + sign;
        let next_b = running.get(&pair.leg_b).copied().unwrap_or(0) - sign;
        if next_a.abs() > limits.security_cap || next_b.abs() > limits.security_cap {
            debug!(pair = %pair, %side, next_a, next_b, "Security cap reached, skipping candidate");
            outcome.cap_rejections += 1;
            continue;
        }

        let gross_dollars = budget / Decimal::from(slots as u64);
        if !can_open_pair(pair, prices, gross_dollars) {
            debug!(pair = %pair, %gross_dollars, "Allocation too small for a leg, skipping candidate");
            outcome.size_rejections += 1;
            continue;
        }
        add_leg_counts(&mut running, pair, side);
        budget -= gross_dollars;
        slots -= 1;
        outcome.admitted.push(Admission {
            pair: pair.clone(),
            side,
            gross_dollars,
        });
    }

    outcome
}
