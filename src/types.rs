//! Common Types Module
//!
//! Identifiers and direction flags shared by the portfolio, selection and
//! backtest modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delimiter used by the external score feed to join the two leg ids.
pub const PAIR_DELIMITER: char = '~';

/// Identifier of a single tradable security (e.g., "AAPL").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityId(String);

impl SecurityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SecurityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Ordered pair of securities traded as one combined position.
///
/// The external feed spells this as `LEGA~LEGB`; that string form is only
/// used at the boundary (`FromStr` / `Display`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId {
    pub leg_a: SecurityId,
    pub leg_b: SecurityId,
}

impl PairId {
    pub fn new(leg_a: impl Into<SecurityId>, leg_b: impl Into<SecurityId>) -> Self {
        Self {
            leg_a: leg_a.into(),
            leg_b: leg_b.into(),
        }
    }

    /// Both legs, A first.
    pub fn legs(&self) -> [&SecurityId; 2] {
        [&self.leg_a, &self.leg_b]
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.leg_a, PAIR_DELIMITER, self.leg_b)
    }
}

/// Error returned when a composite pair id cannot be split into two legs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid pair id '{0}': expected LEGA~LEGB")]
pub struct ParsePairIdError(pub String);

impl FromStr for PairId {
    type Err = ParsePairIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(PAIR_DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() && a != b => {
                Ok(PairId::new(a, b))
            }
            _ => Err(ParsePairIdError(s.to_string())),
        }
    }
}

/// Direction of a pair position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Long leg A, short leg B.
    Long,
    /// Short leg A, long leg B.
    Short,
}

impl Side {
    /// Positive scores open long-A/short-B, negative scores the reverse.
    /// Returns `None` for zero or non-finite scores.
    pub fn from_score(score: f64) -> Option<Self> {
        if !score.is_finite() || score == 0.0 {
            None
        } else if score > 0.0 {
            Some(Side::Long)
        } else {
            Some(Side::Short)
        }
    }

    /// Signed unit exposure of leg A (+1 long, -1 short). Leg B is the negation.
    pub fn leg_a_sign(self) -> i64 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    /// True if `score` points the other way.
    pub fn is_reversed_by(self, score: f64) -> bool {
        match self {
            Side::Long => score < 0.0,
            Side::Short => score > 0.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}
