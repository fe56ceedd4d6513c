//! Market Data Inputs
//!
//! In-memory score and pricing feeds consumed by the simulation. Both are
//! loaded up front by the data-preparation collaborator and aligned to the
//! same daily grid; the engine never performs I/O while a run is in progress.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::backtest::EngineError;
use crate::types::{PairId, SecurityId};

/// One security's pricing row for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Close price; `None` marks a data outage.
    pub close: Option<Decimal>,
    /// Cash dividend per share paid on this day (0 if none).
    pub dividend: Decimal,
    /// Split multiplier effective this day (1 if none).
    pub split: Decimal,
}

impl PriceBar {
    pub fn new(close: Decimal) -> Self {
        Self {
            close: Some(close),
            ..Default::default()
        }
    }

    /// A bar with no usable price.
    pub fn missing() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dividend(mut self, dividend: Decimal) -> Self {
        self.dividend = dividend;
        self
    }

    #[must_use]
    pub fn with_split(mut self, split: Decimal) -> Self {
        self.split = split;
        self
    }

    /// Close price if it is present and strictly positive.
    pub fn tradable_price(&self) -> Option<Decimal> {
        self.close.filter(|p| *p > Decimal::ZERO)
    }
}

impl Default for PriceBar {
    fn default() -> Self {
        Self {
            close: None,
            dividend: Decimal::ZERO,
            split: Decimal::ONE,
        }
    }
}

/// All pricing rows for a single date.
#[derive(Debug, Clone, Default)]
pub struct DailyPrices {
    bars: HashMap<SecurityId, PriceBar>,
}

impl DailyPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, security: impl Into<SecurityId>, bar: PriceBar) {
        self.bars.insert(security.into(), bar);
    }

    /// Pricing row for `security`; securities absent from the day read as missing.
    pub fn bar(&self, security: &SecurityId) -> PriceBar {
        self.bars.get(security).copied().unwrap_or_default()
    }

    pub fn tradable_price(&self, security: &SecurityId) -> Option<Decimal> {
        self.bars.get(security).and_then(PriceBar::tradable_price)
    }

    /// True if both legs of `pair` have a usable price.
    pub fn has_pair(&self, pair: &PairId) -> bool {
        self.tradable_price(&pair.leg_a).is_some() && self.tradable_price(&pair.leg_b).is_some()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl FromIterator<(SecurityId, PriceBar)> for DailyPrices {
    fn from_iter<I: IntoIterator<Item = (SecurityId, PriceBar)>>(iter: I) -> Self {
        Self {
            bars: iter.into_iter().collect(),
        }
    }
}

/// Pricing feed: (date, security) -> close, dividend, split.
///
/// The set of dates in this feed defines the simulation horizon.
#[derive(Debug, Clone, Default)]
pub struct PriceFeed {
    days: BTreeMap<NaiveDate, DailyPrices>,
}

impl PriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, security: impl Into<SecurityId>, bar: PriceBar) {
        self.days.entry(date).or_default().insert(security, bar);
    }

    /// Register a trading date even if no security prints on it.
    pub fn add_date(&mut self, date: NaiveDate) {
        self.days.entry(date).or_default();
    }

    /// Trading dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    pub fn on(&self, date: NaiveDate) -> Option<&DailyPrices> {
        self.days.get(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Score feed: (date, pair) -> signed score.
///
/// Entries keep the order in which they were inserted for each date; that
/// order is the tie-break when candidates have equal absolute scores.
#[derive(Debug, Clone, Default)]
pub struct ScoreFeed {
    days: BTreeMap<NaiveDate, DayScores>,
}

/// One date's scores in feed order, indexed by pair.
#[derive(Debug, Clone, Default)]
struct DayScores {
    entries: Vec<(PairId, f64)>,
    index: HashMap<PairId, usize>,
}

impl DayScores {
    fn get(&self, pair: &PairId) -> Option<f64> {
        self.index.get(pair).map(|&i| self.entries[i].1)
    }
}

impl ScoreFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the score of `pair` on `date`.
    pub fn insert(&mut self, date: NaiveDate, pair: PairId, score: f64) {
        let day = self.days.entry(date).or_default();
        match day.index.get(&pair) {
            Some(&i) => day.entries[i].1 = score,
            None => {
                day.index.insert(pair.clone(), day.entries.len());
                day.entries.push((pair, score));
            }
        }
    }

    /// Insert a score keyed by the feed's composite `LEGA~LEGB` id.
    pub fn insert_raw(&mut self, date: NaiveDate, pair_id: &str, score: f64) -> Result<(), EngineError> {
        let pair = pair_id.parse::<PairId>()?;
        self.insert(date, pair, score);
        Ok(())
    }

    /// Scores for `date` in feed order (empty if the date has none).
    pub fn on(&self, date: NaiveDate) -> &[(PairId, f64)] {
        self.days.get(&date).map(|d| d.entries.as_slice()).unwrap_or(&[])
    }

    /// Lookup table for `date`, used when re-scoring open positions.
    pub fn lookup(&self, date: NaiveDate) -> HashMap<&PairId, f64> {
        self.on(date).iter().map(|(p, s)| (p, *s)).collect()
    }

    pub fn score(&self, date: NaiveDate, pair: &PairId) -> Option<f64> {
        self.days.get(&date)?.get(pair)
    }

    pub fn len(&self) -> usize {
        self.days.values().map(|d| d.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|d| d.entries.is_empty())
    }
}
