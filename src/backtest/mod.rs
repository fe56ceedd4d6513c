//! Simulation engine: configuration, the daily loop, reports and sweeps.

mod config;
mod constructor;
mod error;
mod report;
mod sweep;

pub use config::{PolicyKind, SimulationConfig};
pub use constructor::PortfolioConstructor;
pub use error::EngineError;
pub use report::{DailyRecord, RunCounters, SimulationReport};
pub use sweep::run_sweep;
