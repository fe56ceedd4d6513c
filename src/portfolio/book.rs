//! Collection of open pair positions.
//!
//! The portfolio is the only owner of `PairPosition` values. Positions that
//! become terminal during a price update are settled and evicted right away,
//! so every position held between calls is open.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::position::{DayTotals, PairPosition};
use crate::market::DailyPrices;
use crate::types::{PairId, SecurityId, Side};

#[derive(Debug, Clone)]
pub struct PairPortfolio {
    positions: BTreeMap<PairId, PairPosition>,
    commission_per_share: Decimal,
    /// Day totals of positions already evicted today.
    settled: DayTotals,
}

impl PairPortfolio {
    pub fn new(commission_per_share: Decimal) -> Self {
        Self {
            positions: BTreeMap::new(),
            commission_per_share,
            settled: DayTotals::default(),
        }
    }

    /// Mark every open position to `prices`.
    ///
    /// Must run first in each simulated day. Positions force-closed by a
    /// missing price are evicted and their ids returned.
    pub fn update_prices(&mut self, prices: &DailyPrices) -> Vec<PairId> {
        for position in self.positions.values_mut() {
            let pair = position.pair();
            let bar_a = prices.bar(&pair.leg_a);
            let bar_b = prices.bar(&pair.leg_b);
            position.update_prices(&bar_a, &bar_b);
        }
        self.evict_closed()
    }

    /// Open `pair` with `gross_dollars` split evenly across both legs.
    ///
    /// Returns false without changing anything if the pair is already held
    /// or the position cannot be opened at these prices.
    pub fn add_pair(&mut self, pair: PairId, prices: &DailyPrices, gross_dollars: Decimal, side: Side) -> bool {
        if self.positions.contains_key(&pair) {
            warn!(pair = %pair, "Pair already open, ignoring duplicate open");
            return false;
        }
        let leg_dollars = gross_dollars / Decimal::TWO;
        let opened = PairPosition::open(
            pair.clone(),
            prices.tradable_price(&pair.leg_a),
            prices.tradable_price(&pair.leg_b),
            leg_dollars,
            side,
            self.commission_per_share,
        );
        match opened {
            Some(position) => {
                debug!(
                    pair = %pair,
                    %side,
                    shares = ?position.shares(),
                    exposure = %position.exposure(),
                    "Opened pair"
                );
                self.positions.insert(pair, position);
                true
            }
            None => {
                debug!(pair = %pair, %gross_dollars, "Pair could not be opened at current prices");
                false
            }
        }
    }

    /// Close and evict the named pairs; unknown ids are skipped.
    ///
    /// Returns the number of positions closed.
    pub fn remove_pairs<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a PairId>,
    {
        let mut removed = 0;
        for id in ids {
            if let Some(mut position) = self.positions.remove(id) {
                position.close();
                self.settled += position.drain_day();
                removed += 1;
            }
        }
        removed
    }

    /// Close and evict every position.
    pub fn close_all(&mut self) -> usize {
        let ids: Vec<PairId> = self.positions.keys().cloned().collect();
        self.remove_pairs(&ids)
    }

    /// Resize an open pair toward `target_gross`; false if not held or not resizable.
    pub fn resize_pair(&mut self, pair: &PairId, target_gross: Decimal) -> bool {
        self.positions
            .get_mut(pair)
            .map(|p| p.resize(target_gross))
            .unwrap_or(false)
    }

    pub fn gross_exposure(&self) -> Decimal {
        self.positions.values().map(PairPosition::exposure).sum()
    }

    /// Today's P&L so far, without resetting anything.
    pub fn daily_pl(&self) -> Decimal {
        self.settled.pl + self.positions.values().map(PairPosition::day_pl).sum::<Decimal>()
    }

    pub fn daily_turnover(&self) -> Decimal {
        self.settled.turnover + self.positions.values().map(PairPosition::day_turnover).sum::<Decimal>()
    }

    /// Read today's P&L and turnover and reset every accumulator.
    ///
    /// Call exactly once per simulated day.
    pub fn drain_day(&mut self) -> DayTotals {
        let mut totals = std::mem::take(&mut self.settled);
        for position in self.positions.values_mut() {
            totals += position.drain_day();
        }
        totals
    }

    /// Read today's P&L and reset the accumulators (turnover is reset too).
    pub fn drain_daily_pl(&mut self) -> Decimal {
        self.drain_day().pl
    }

    /// Signed count of pair legs held per security: +1 per long leg, -1 per short leg.
    pub fn security_exposure_counts(&self) -> HashMap<SecurityId, i64> {
        let mut counts = HashMap::new();
        for position in self.positions.values() {
            add_leg_counts(&mut counts, position.pair(), position.side());
        }
        counts
    }

    pub fn contains(&self, pair: &PairId) -> bool {
        self.positions.contains_key(pair)
    }

    pub fn get(&self, pair: &PairId) -> Option<&PairPosition> {
        self.positions.get(pair)
    }

    /// Open positions in pair-id order.
    pub fn positions(&self) -> impl Iterator<Item = &PairPosition> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn commission_per_share(&self) -> Decimal {
        self.commission_per_share
    }

    fn evict_closed(&mut self) -> Vec<PairId> {
        let closed: Vec<PairId> = self
            .positions
            .iter()
            .filter(|(_, p)| p.is_closed())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &closed {
            if let Some(mut position) = self.positions.remove(id) {
                self.settled += position.drain_day();
            }
        }
        closed
    }
}

/// True if `add_pair` could open `pair` with `gross_dollars` at `prices`.
pub fn can_open_pair(pair: &PairId, prices: &DailyPrices, gross_dollars: Decimal) -> bool {
    PairPosition::can_open(
        prices.tradable_price(&pair.leg_a),
        prices.tradable_price(&pair.leg_b),
        gross_dollars / Decimal::TWO,
    )
}

/// Add the unit leg exposures implied by holding `pair` on `side`.
pub fn add_leg_counts(counts: &mut HashMap<SecurityId, i64>, pair: &PairId, side: Side) {
    let sign = side.leg_a_sign();
    *counts.entry(pair.leg_a.clone()).or_insert(0) += sign;
    *counts.entry(pair.leg_b.clone()).or_insert(0) -= sign;
}
