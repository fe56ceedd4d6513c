//! Prometheus Metrics Module
//!
//! Process-wide counters for simulation runs. Parallel sweeps share the same
//! registry, so values aggregate across runs.

use lazy_static::lazy_static;
use prometheus::{opts, register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

lazy_static! {
    /// Pairs opened
    pub static ref PAIRS_OPENED: IntCounter = register_int_counter!(
        opts!("pairbook_pairs_opened_total", "Pairs opened")
    ).expect("FATAL: Failed to register PAIRS_OPENED metric - check for duplicate registration");

    /// Pairs closed (by reason)
    pub static ref PAIRS_CLOSED: IntCounterVec = register_int_counter_vec!(
        opts!("pairbook_pairs_closed_total", "Pairs closed"),
        &["reason"]
    ).expect("FATAL: Failed to register PAIRS_CLOSED metric - check for duplicate registration");

    /// Candidates skipped during admission (by reason)
    pub static ref ADMISSION_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        opts!("pairbook_admission_rejections_total", "Candidates rejected during admission"),
        &["reason"]
    ).expect("FATAL: Failed to register ADMISSION_REJECTIONS metric - check for duplicate registration");

    /// Days on which gross exposure exceeded 110% of book size
    pub static ref EXPOSURE_WARNINGS: IntCounter = register_int_counter!(
        opts!("pairbook_exposure_warnings_total", "Days with gross exposure above 110% of book size")
    ).expect("FATAL: Failed to register EXPOSURE_WARNINGS metric - check for duplicate registration");

    /// Simulated trading days
    pub static ref SIMULATED_DAYS: IntCounter = register_int_counter!(
        opts!("pairbook_simulated_days_total", "Simulated trading days")
    ).expect("FATAL: Failed to register SIMULATED_DAYS metric - check for duplicate registration");
}

pub fn record_opened(count: usize) {
    PAIRS_OPENED.inc_by(count as u64);
}

pub fn record_closed(reason: &str) {
    PAIRS_CLOSED.with_label_values(&[reason]).inc();
}

/// `reason` is `security_cap` or `zero_shares`.
pub fn record_admission_rejections(reason: &str, count: usize) {
    if count > 0 {
        ADMISSION_REJECTIONS
            .with_label_values(&[reason])
            .inc_by(count as u64);
    }
}

pub fn record_exposure_warning() {
    EXPOSURE_WARNINGS.inc();
}

pub fn record_simulated_day() {
    SIMULATED_DAYS.inc();
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode Prometheus metrics: {}", e);
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Prometheus metrics buffer is not valid UTF-8: {}", e);
            String::new()
        }
    }
}
