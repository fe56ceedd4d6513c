//! Exposure Monitor
//!
//! Book-level exposure checks run once per simulated day.
//!
//! # Architecture
//!
//! - Aggregate gross exposure above 110% of book size is a soft signal:
//!   logged as a warning, never deleveraged
//! - The signed per-security leg count must stay within the configured cap;
//!   a breach is an engine fault and aborts the run

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::warn;

use crate::backtest::EngineError;
use crate::metrics;
use crate::types::SecurityId;

/// Aggregate exposure above `book_size * EXPOSURE_WARNING_MULTIPLIER` warns.
pub const EXPOSURE_WARNING_MULTIPLIER: Decimal = dec!(1.1);

/// Status returned from the aggregate exposure check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureStatus {
    /// Within 110% of book size
    Normal,
    /// Above 110% of book size, simulation continues
    Warning,
}

impl std::fmt::Display for ExposureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExposureMonitor {
    book_size: Decimal,
    security_cap: i64,
}

impl ExposureMonitor {
    pub fn new(book_size: Decimal, security_cap: i64) -> Self {
        Self {
            book_size,
            security_cap,
        }
    }

    /// Compare aggregate gross exposure against the book size.
    ///
    /// The caller owns the per-run warning count.
    pub fn check_gross(&self, gross_exposure: Decimal) -> ExposureStatus {
        let limit = self.book_size * EXPOSURE_WARNING_MULTIPLIER;
        if gross_exposure > limit {
            metrics::record_exposure_warning();
            warn!(
                gross_exposure = %gross_exposure,
                book_size = %self.book_size,
                limit = %limit,
                "Gross exposure above 110% of book size"
            );
            ExposureStatus::Warning
        } else {
            ExposureStatus::Normal
        }
    }

    /// Verify every signed per-security count is within the cap.
    pub fn check_security_caps(&self, counts: &HashMap<SecurityId, i64>) -> Result<(), EngineError> {
        // Sorted for a deterministic error when several securities breach.
        let mut breaches: Vec<(&SecurityId, i64)> = counts
            .iter()
            .filter(|(_, c)| c.abs() > self.security_cap)
            .map(|(s, c)| (s, *c))
            .collect();
        breaches.sort();
        match breaches.first() {
            Some((security, count)) => Err(EngineError::ExposureCapViolated {
                security: security.to_string(),
                count: *count,
                cap: self.security_cap,
            }),
            None => Ok(()),
        }
    }

    pub fn book_size(&self) -> Decimal {
        self.book_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gross_within_tolerance() {
        let monitor = ExposureMonitor::new(dec!(1000), 2);
        assert_eq!(monitor.check_gross(dec!(1100)), ExposureStatus::Normal);
        assert_eq!(monitor.check_gross(dec!(0)), ExposureStatus::Normal);
    }

    #[test]
    fn test_gross_above_tolerance_warns() {
        let monitor = ExposureMonitor::new(dec!(1000), 2);
        assert_eq!(monitor.check_gross(dec!(1100.01)), ExposureStatus::Warning);
        assert_eq!(monitor.check_gross(dec!(5000)), ExposureStatus::Warning);
    }

    #[test]
    fn test_security_cap_check() {
        let monitor = ExposureMonitor::new(dec!(1000), 2);
        let mut counts = HashMap::new();
        counts.insert(SecurityId::from("A"), -2);
        counts.insert(SecurityId::from("B"), 1);
        assert!(monitor.check_security_caps(&counts).is_ok());

        counts.insert(SecurityId::from("C"), 3);
        match monitor.check_security_caps(&counts) {
            Err(EngineError::ExposureCapViolated { security, count, cap }) => {
                assert_eq!(security, "C");
                assert_eq!(count, 3);
                assert_eq!(cap, 2);
            }
            other => panic!("expected cap violation, got {:?}", other),
        }
    }
}
