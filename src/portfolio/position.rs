//! Two-leg pair position.
//!
//! A `PairPosition` owns share counts and last-seen prices for both legs and
//! accumulates its own daily P&L and turnover until the owning portfolio
//! drains them. Legs are sized dollar-neutral at entry.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::market::PriceBar;
use crate::math::{notional, safe_ratio, shares_for_notional};
use crate::types::{PairId, Side};

/// Per-day totals drained from a position or portfolio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTotals {
    pub pl: Decimal,
    pub turnover: Decimal,
}

impl std::ops::AddAssign for DayTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.pl += rhs.pl;
        self.turnover += rhs.turnover;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairPosition {
    pair: PairId,
    side: Side,
    /// Signed share count of leg A (positive = long).
    shares_a: i64,
    /// Signed share count of leg B (always opposite sign to leg A).
    shares_b: i64,
    /// Last seen price of leg A.
    price_a: Decimal,
    /// Last seen price of leg B.
    price_b: Decimal,
    entry_exposure: Decimal,
    exposure: Decimal,
    /// Cumulative P&L since entry, commissions included.
    total_pl: Decimal,
    /// P&L not yet drained by the portfolio.
    day_pl: Decimal,
    /// Dollar value traded not yet drained by the portfolio.
    day_turnover: Decimal,
    holding_days: u32,
    rebalances: u32,
    commission_per_share: Decimal,
    closed: bool,
    missing_price: bool,
}

impl PairPosition {
    /// Open a position with `leg_dollars` on each leg.
    ///
    /// Returns `None` (no position) if either price is missing or not
    /// positive, or if either leg would round to zero shares. The opening
    /// commission is charged to the position's pending day P&L.
    pub fn open(
        pair: PairId,
        price_a: Option<Decimal>,
        price_b: Option<Decimal>,
        leg_dollars: Decimal,
        side: Side,
        commission_per_share: Decimal,
    ) -> Option<Self> {
        let Some((price_a, price_b, unsigned_a, unsigned_b)) = entry_sizing(price_a, price_b, leg_dollars) else {
            debug!(pair = %pair, %leg_dollars, "Missing price or zero-share leg, not opening");
            return None;
        };
        let sign = side.leg_a_sign();
        let shares_a = unsigned_a * sign;
        let shares_b = unsigned_b * -sign;

        let exposure = notional(shares_a, price_a) + notional(shares_b, price_b);
        let commission = commission_per_share * Decimal::from(shares_a.abs() + shares_b.abs());

        Some(Self {
            pair,
            side,
            shares_a,
            shares_b,
            price_a,
            price_b,
            entry_exposure: exposure,
            exposure,
            total_pl: -commission,
            day_pl: -commission,
            day_turnover: exposure,
            holding_days: 0,
            rebalances: 0,
            commission_per_share,
            closed: false,
            missing_price: false,
        })
    }

    /// True if `open` would succeed at these prices with `leg_dollars` per leg.
    pub fn can_open(price_a: Option<Decimal>, price_b: Option<Decimal>, leg_dollars: Decimal) -> bool {
        entry_sizing(price_a, price_b, leg_dollars).is_some()
    }

    /// Mark both legs to today's bars.
    ///
    /// Splits are applied first (shares times factor, stored price divided by
    /// factor), then the day's P&L is the price move on each leg plus
    /// dividends on the absolute share count. A missing price on either leg
    /// force-closes the position at its last seen prices.
    pub fn update_prices(&mut self, bar_a: &PriceBar, bar_b: &PriceBar) {
        if self.closed {
            return;
        }

        let (new_a, new_b) = match (bar_a.tradable_price(), bar_b.tradable_price()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                warn!(
                    pair = %self.pair,
                    price_a = ?bar_a.close,
                    price_b = ?bar_b.close,
                    "Missing price on open leg, forcing close"
                );
                self.missing_price = true;
                self.close();
                return;
            }
        };

        apply_split(&self.pair.leg_a, &mut self.shares_a, &mut self.price_a, bar_a.split);
        apply_split(&self.pair.leg_b, &mut self.shares_b, &mut self.price_b, bar_b.split);

        let shares_a = Decimal::from(self.shares_a);
        let shares_b = Decimal::from(self.shares_b);
        let pl = (new_a - self.price_a) * shares_a
            + (new_b - self.price_b) * shares_b
            + bar_a.dividend * shares_a.abs()
            + bar_b.dividend * shares_b.abs();

        self.price_a = new_a;
        self.price_b = new_b;
        self.exposure = notional(self.shares_a, new_a) + notional(self.shares_b, new_b);
        self.day_pl += pl;
        self.total_pl += pl;
        self.holding_days += 1;
    }

    /// Exit both legs at the last seen prices.
    ///
    /// Returns the commission charged; closing an already-closed position
    /// is a no-op returning zero.
    pub fn close(&mut self) -> Decimal {
        if self.closed {
            return Decimal::ZERO;
        }
        let traded = Decimal::from(self.shares_a.abs() + self.shares_b.abs());
        let commission = self.commission_per_share * traded;

        self.day_turnover += notional(self.shares_a, self.price_a) + notional(self.shares_b, self.price_b);
        self.day_pl -= commission;
        self.total_pl -= commission;
        self.shares_a = 0;
        self.shares_b = 0;
        self.exposure = Decimal::ZERO;
        self.closed = true;
        commission
    }

    /// Resize both legs toward `target_gross` total exposure at last seen
    /// prices, charging commission only on the shares traded.
    ///
    /// Returns false (and changes nothing) if the position is closed or a
    /// leg would round to zero shares.
    pub fn resize(&mut self, target_gross: Decimal) -> bool {
        if self.closed {
            return false;
        }
        let leg_dollars = target_gross.abs() / Decimal::TWO;
        let sign = self.side.leg_a_sign();
        let (Some(new_a), Some(new_b)) = (
            shares_for_notional(leg_dollars, self.price_a),
            shares_for_notional(leg_dollars, self.price_b),
        ) else {
            return false;
        };
        if new_a == 0 || new_b == 0 {
            return false;
        }
        let new_a = new_a * sign;
        let new_b = new_b * -sign;

        let delta_a = new_a - self.shares_a;
        let delta_b = new_b - self.shares_b;
        let commission = self.commission_per_share * Decimal::from(delta_a.abs() + delta_b.abs());

        self.day_turnover += notional(delta_a, self.price_a) + notional(delta_b, self.price_b);
        self.day_pl -= commission;
        self.total_pl -= commission;
        self.shares_a = new_a;
        self.shares_b = new_b;
        self.exposure = notional(new_a, self.price_a) + notional(new_b, self.price_b);
        self.rebalances += 1;
        true
    }

    /// Take and reset the pending day P&L and turnover.
    pub fn drain_day(&mut self) -> DayTotals {
        let totals = DayTotals {
            pl: self.day_pl,
            turnover: self.day_turnover,
        };
        self.day_pl = Decimal::ZERO;
        self.day_turnover = Decimal::ZERO;
        totals
    }

    pub fn pair(&self) -> &PairId {
        &self.pair
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn shares(&self) -> (i64, i64) {
        (self.shares_a, self.shares_b)
    }

    pub fn prices(&self) -> (Decimal, Decimal) {
        (self.price_a, self.price_b)
    }

    /// Gross exposure: sum of |shares * price| over both legs.
    pub fn exposure(&self) -> Decimal {
        self.exposure
    }

    pub fn entry_exposure(&self) -> Decimal {
        self.entry_exposure
    }

    /// Pending (undrained) P&L.
    pub fn day_pl(&self) -> Decimal {
        self.day_pl
    }

    pub fn day_turnover(&self) -> Decimal {
        self.day_turnover
    }

    pub fn total_pl(&self) -> Decimal {
        self.total_pl
    }

    /// Cumulative P&L as a fraction of entry exposure.
    pub fn return_on_entry(&self) -> Option<Decimal> {
        safe_ratio(self.total_pl, self.entry_exposure)
    }

    pub fn holding_days(&self) -> u32 {
        self.holding_days
    }

    pub fn rebalances(&self) -> u32 {
        self.rebalances
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True if the position was force-closed by a price outage.
    pub fn closed_on_missing_price(&self) -> bool {
        self.missing_price
    }
}

/// Tradable prices and unsigned share counts for an entry, or `None` if a
/// price is unusable or a leg rounds to zero shares.
fn entry_sizing(
    price_a: Option<Decimal>,
    price_b: Option<Decimal>,
    leg_dollars: Decimal,
) -> Option<(Decimal, Decimal, i64, i64)> {
    let price_a = price_a.filter(|p| *p > Decimal::ZERO)?;
    let price_b = price_b.filter(|p| *p > Decimal::ZERO)?;
    let leg_dollars = leg_dollars.abs();
    let shares_a = shares_for_notional(leg_dollars, price_a)?;
    let shares_b = shares_for_notional(leg_dollars, price_b)?;
    if shares_a == 0 || shares_b == 0 {
        return None;
    }
    Some((price_a, price_b, shares_a, shares_b))
}

fn apply_split(security: &crate::types::SecurityId, shares: &mut i64, price: &mut Decimal, factor: Decimal) {
    if factor == Decimal::ONE {
        return;
    }
    if factor <= Decimal::ZERO {
        warn!(security = %security, %factor, "Ignoring non-positive split factor");
        return;
    }
    let Some(split_shares) = (Decimal::from(*shares) * factor).trunc().to_i64() else {
        warn!(security = %security, %factor, "Split share count out of range, ignoring split");
        return;
    };
    debug!(security = %security, %factor, before = *shares, after = split_shares, "Applying split");
    *shares = split_shares;
    *price /= factor;
}
