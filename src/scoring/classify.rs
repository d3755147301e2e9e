//! Risk Classifier
//!
//! Buckets the exposure index into `low < medium < high` using tertile
//! cut points of the current batch.
//!
//! Classification is relative: the cut points are recomputed from every
//! batch, so the same exposure value can land in different tiers when it
//! is scored alongside different neighbours. There is no absolute scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Distinct values needed for a three-way split
pub const MIN_DISTINCT_VALUES: usize = 3;

/// Ordinal risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Slot in fixed-size per-level tables
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(RiskError::InvalidRiskLevel {
                value: s.to_string(),
            }),
        }
    }
}

/// Tertile cut points of one batch
///
/// Bins are right-inclusive with the lowest edge included:
/// `low = [min, lower]`, `medium = (lower, upper]`, `high = (upper, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TertileBreaks {
    pub min: f64,
    pub lower: f64,
    pub upper: f64,
    pub max: f64,
}

impl TertileBreaks {
    /// Compute the 1/3 and 2/3 quantiles of `values`
    ///
    /// # Errors
    /// `InsufficientData` when fewer than three distinct values exist, or
    /// when the cut points leave the medium or high tier empty.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut distinct = sorted.clone();
        distinct.dedup();
        if distinct.len() < MIN_DISTINCT_VALUES {
            return Err(RiskError::InsufficientData {
                distinct: distinct.len(),
                required: MIN_DISTINCT_VALUES,
            });
        }

        let breaks = Self {
            min: sorted[0],
            lower: quantile(&sorted, 1.0 / 3.0),
            upper: quantile(&sorted, 2.0 / 3.0),
            max: sorted[sorted.len() - 1],
        };

        // cuts may fall between order statistics; every tier needs a value
        let mut counts = [0usize; 3];
        for value in &sorted {
            counts[breaks.classify(*value).index()] += 1;
        }
        if counts.contains(&0) {
            return Err(RiskError::InsufficientData {
                distinct: distinct.len(),
                required: MIN_DISTINCT_VALUES,
            });
        }

        Ok(breaks)
    }

    pub fn classify(&self, value: f64) -> RiskLevel {
        if value <= self.lower {
            RiskLevel::Low
        } else if value <= self.upper {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Linear interpolation between order statistics at position `q·(n−1)`
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    let fraction = position - below as f64;
    sorted[below] + (sorted[above] - sorted[below]) * fraction
}

/// Classify every exposure value against the batch's own tertiles
pub fn classify(exposure: &[f64]) -> Result<(TertileBreaks, Vec<RiskLevel>)> {
    let breaks = TertileBreaks::from_values(exposure)?;
    let levels = exposure.iter().map(|v| breaks.classify(*v)).collect();
    Ok((breaks, levels))
}
