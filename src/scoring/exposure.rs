//! Exposure Scorer
//!
//! The exposure index of a feature is the weighted mean
//! `Σ(wᵢ·vᵢ) / Σwᵢ` of the weight fields, with positional weights
//! `1, 2, …, n` in the order the fields are listed. Later fields weigh
//! more. Null values count as 0, which dilutes the index instead of
//! dropping the feature.
//!
//! The result stays in the units of the input fields; it is not rescaled
//! to `[0, 1]`.

use crate::error::{Result, RiskError};
use crate::layers::SpatialLayer;

/// Name of the derived exposure column
pub const EXPOSURE_FIELD: &str = "exposure_index";

/// Positional weights `1..=n`
pub fn exposure_weights(n: usize) -> Vec<f64> {
    (1..=n).map(|w| w as f64).collect()
}

/// Add the `exposure_index` column to a harmonised layer
///
/// Row count and order are preserved; an existing `exposure_index`
/// column is overwritten.
///
/// # Errors
/// - `EmptyWeightFields` if `weight_fields` is empty
/// - `FieldNotFound` if a weight field is not in the layer schema
/// - `NonNumericField` if a weight field holds text
pub fn score(layer: &SpatialLayer, weight_fields: &[String]) -> Result<SpatialLayer> {
    let exposure = exposure_values(layer, weight_fields)?;
    Ok(layer.with_column(EXPOSURE_FIELD, exposure))
}

/// Per-feature exposure index without attaching it to the layer
pub fn exposure_values(layer: &SpatialLayer, weight_fields: &[String]) -> Result<Vec<f64>> {
    if weight_fields.is_empty() {
        return Err(RiskError::EmptyWeightFields);
    }

    let weights = exposure_weights(weight_fields.len());
    let total_weight: f64 = weights.iter().sum();

    let mut weighted_sum = vec![0.0; layer.len()];
    for (weight, field) in weights.iter().zip(weight_fields) {
        let column = layer.numeric_column(field, "harmonised")?;
        for (acc, value) in weighted_sum.iter_mut().zip(column) {
            *acc += weight * value.unwrap_or(0.0);
        }
    }

    Ok(weighted_sum.into_iter().map(|sum| sum / total_weight).collect())
}
