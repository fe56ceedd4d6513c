//! Numeric helpers shared by the position, portfolio and backtest modules.
//!
//! All dollar arithmetic stays in `Decimal`; only statistics leave it
//! through [`to_f64`].

pub mod sizing;

pub use sizing::{notional, safe_ratio, shares_for_notional, to_f64};
