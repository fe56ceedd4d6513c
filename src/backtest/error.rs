//! Error types for the backtest engine

use thiserror::Error;

use crate::types::ParsePairIdError;

/// Errors that can stop a simulation run.
///
/// Market-data gaps are not errors; they are absorbed by force-closing the
/// affected positions.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Structurally invalid configuration, rejected before day one
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pricing feed holds no trading dates
    #[error("Simulation horizon is empty")]
    EmptyHorizon,

    /// A composite pair id could not be split into legs
    #[error("Invalid pair id '{0}': expected LEGA~LEGB")]
    InvalidPairId(String),

    /// Per-security exposure cap breached after Open-Evaluation
    #[error("Exposure cap violated for {security}: count {count} exceeds cap {cap}")]
    ExposureCapViolated {
        security: String,
        count: i64,
        cap: i64,
    },

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A sweep worker task failed to complete
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<ParsePairIdError> for EngineError {
    fn from(err: ParsePairIdError) -> Self {
        EngineError::InvalidPairId(err.0)
    }
}
