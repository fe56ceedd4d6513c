//! Configuration for a single simulation run

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::EngineError;
use crate::selection::{HoldingPeriodPolicy, SelectionPolicy, ThresholdPolicy};

/// Which selection policy variant drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Score exits, time stop, optional take-profit and rebalancing
    #[default]
    Threshold,
    /// Fixed holding period with optional take-profit
    HoldingPeriod,
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threshold" => Ok(Self::Threshold),
            "holding-period" | "holding_period" => Ok(Self::HoldingPeriod),
            _ => Err(format!(
                "Unknown policy: '{}'. Use 'threshold' or 'holding_period'",
                s
            )),
        }
    }
}

/// Flat parameter set for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Target total gross exposure in dollars
    #[serde(default = "default_book_size")]
    pub book_size: Decimal,

    /// Target number of simultaneously open pairs
    #[serde(default = "default_target_pairs")]
    pub target_pairs: usize,

    /// Max absolute signed pair-leg count per security
    #[serde(default = "default_max_security_exposure")]
    pub max_security_exposure: u32,

    /// Minimum |score| for a candidate to be considered
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: f64,

    /// |score| below which an open pair closes (must be <= entry_threshold)
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: f64,

    /// Close once a pair has been held longer than this many days
    #[serde(default = "default_max_holding_days")]
    pub max_holding_days: u32,

    /// Close once cumulative P&L / entry exposure reaches this fraction
    #[serde(default)]
    pub take_profit: Option<Decimal>,

    /// Resize drifted positions back to target exposure
    #[serde(default)]
    pub rebalance: bool,

    /// Drift, as a fraction of target per-pair exposure, that triggers a resize
    #[serde(default = "default_rebalance_deviation")]
    pub rebalance_deviation: Decimal,

    /// Dollars charged per share traded
    #[serde(default = "default_commission_per_share")]
    pub commission_per_share: Decimal,

    #[serde(default)]
    pub policy: PolicyKind,
}

fn default_book_size() -> Decimal {
    dec!(1_000_000)
}
fn default_target_pairs() -> usize {
    20
}
fn default_max_security_exposure() -> u32 {
    2
}
fn default_entry_threshold() -> f64 {
    2.0
}
fn default_exit_threshold() -> f64 {
    0.5
}
fn default_max_holding_days() -> u32 {
    20
}
fn default_rebalance_deviation() -> Decimal {
    dec!(0.25)
}
fn default_commission_per_share() -> Decimal {
    dec!(0.003)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            book_size: default_book_size(),
            target_pairs: default_target_pairs(),
            max_security_exposure: default_max_security_exposure(),
            entry_threshold: default_entry_threshold(),
            exit_threshold: default_exit_threshold(),
            max_holding_days: default_max_holding_days(),
            take_profit: None,
            rebalance: false,
            rebalance_deviation: default_rebalance_deviation(),
            commission_per_share: default_commission_per_share(),
            policy: PolicyKind::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.book_size <= Decimal::ZERO {
            return Err(format!("book_size must be positive, got {}", self.book_size));
        }
        if self.target_pairs == 0 {
            return Err("target_pairs must be at least 1".to_string());
        }
        if self.max_security_exposure == 0 {
            return Err("max_security_exposure must be at least 1".to_string());
        }
        if !self.entry_threshold.is_finite() || self.entry_threshold < 0.0 {
            return Err(format!(
                "entry_threshold must be a non-negative number, got {}",
                self.entry_threshold
            ));
        }
        if !self.exit_threshold.is_finite() || self.exit_threshold < 0.0 {
            return Err(format!(
                "exit_threshold must be a non-negative number, got {}",
                self.exit_threshold
            ));
        }
        if self.exit_threshold > self.entry_threshold {
            return Err(format!(
                "exit_threshold ({}) must not exceed entry_threshold ({})",
                self.exit_threshold, self.entry_threshold
            ));
        }
        if self.max_holding_days == 0 {
            return Err("max_holding_days must be at least 1".to_string());
        }
        if let Some(tp) = self.take_profit {
            if tp <= Decimal::ZERO {
                return Err(format!("take_profit must be positive, got {}", tp));
            }
        }
        if self.rebalance_deviation <= Decimal::ZERO {
            return Err(format!(
                "rebalance_deviation must be positive, got {}",
                self.rebalance_deviation
            ));
        }
        if self.commission_per_share < Decimal::ZERO {
            return Err("commission_per_share cannot be negative".to_string());
        }
        Ok(())
    }

    /// Dollar exposure each open pair is sized toward.
    pub fn target_pair_exposure(&self) -> Decimal {
        self.book_size / Decimal::from(self.target_pairs as u64)
    }

    /// Build the selection policy named by `policy`.
    pub fn build_policy(&self) -> Box<dyn SelectionPolicy> {
        match self.policy {
            PolicyKind::Threshold => Box::new(
                ThresholdPolicy::new(self.exit_threshold, self.max_holding_days)
                    .with_take_profit(self.take_profit)
                    .with_rebalance(self.rebalance),
            ),
            PolicyKind::HoldingPeriod => {
                Box::new(HoldingPeriodPolicy::new(self.max_holding_days, self.take_profit))
            }
        }
    }
}
