//! Daily output table of a simulation run.

use chrono::NaiveDate;
use polars::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::math::{safe_ratio, to_f64};

/// One row per simulated trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// P&L booked on this date, commissions included
    pub pl: Decimal,
    /// Aggregate gross exposure at end of day
    pub gross_exposure: Decimal,
    /// Dollar value of shares traded on this date
    pub turnover: Decimal,
    /// P&L over the previous day's exposure (current day's when there is none)
    pub daily_return: f64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, pl: Decimal, gross_exposure: Decimal, turnover: Decimal, prev_exposure: Decimal) -> Self {
        let base = if prev_exposure > Decimal::ZERO {
            prev_exposure
        } else {
            gross_exposure
        };
        let daily_return = safe_ratio(pl, base).map(to_f64).unwrap_or(0.0);
        Self {
            date,
            pl,
            gross_exposure,
            turnover,
            daily_return,
        }
    }
}

/// Position lifecycle counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub opened: usize,
    pub closed: usize,
    pub missing_price_closes: usize,
    pub rebalances: usize,
    pub cap_rejections: usize,
    pub size_rejections: usize,
    pub exposure_warnings: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    records: Vec<DailyRecord>,
    counters: RunCounters,
}

impl SimulationReport {
    pub fn new(records: Vec<DailyRecord>, counters: RunCounters) -> Self {
        Self { records, counters }
    }

    /// Rows in date order.
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_pl(&self) -> Decimal {
        self.records.iter().map(|r| r.pl).sum()
    }

    pub fn total_turnover(&self) -> Decimal {
        self.records.iter().map(|r| r.turnover).sum()
    }

    /// Exposure on the last row; zero after the forced liquidation.
    pub fn final_exposure(&self) -> Decimal {
        self.records.last().map(|r| r.gross_exposure).unwrap_or_default()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.daily_return).collect()
    }

    /// Columns `date, pl, gross_exposure, turnover, daily_return` for the
    /// statistics collaborator. Dollar columns are converted to f64.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = self.records.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect();
        let pl: Vec<f64> = self.records.iter().map(|r| to_f64(r.pl)).collect();
        let exposure: Vec<f64> = self.records.iter().map(|r| to_f64(r.gross_exposure)).collect();
        let turnover: Vec<f64> = self.records.iter().map(|r| to_f64(r.turnover)).collect();
        let returns = self.returns();

        df! {
            "date" => &dates,
            "pl" => &pl,
            "gross_exposure" => &exposure,
            "turnover" => &turnover,
            "daily_return" => &returns
        }
    }
}
