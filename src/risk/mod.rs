//! Risk Management Module
//!
//! Book-level exposure controls for the simulation.

mod exposure;

pub use exposure::{ExposureMonitor, ExposureStatus, EXPOSURE_WARNING_MULTIPLIER};
