//! Pair Portfolio Module
//!
//! - `PairPosition`: a single two-leg position with its own P&L accounting
//! - `PairPortfolio`: the set of open positions, aggregated per day

pub mod book;
pub mod position;

pub use book::{add_leg_counts, can_open_pair, PairPortfolio};
pub use position::{DayTotals, PairPosition};
