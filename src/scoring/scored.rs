//! Scored risk maps

use serde::{Deserialize, Serialize};

use super::classify::{RiskLevel, TertileBreaks};
use super::exposure::EXPOSURE_FIELD;
use crate::error::{Result, RiskError};
use crate::layers::{FieldValue, SpatialLayer};

/// Name of the derived tier column
pub const RISK_LEVEL_FIELD: &str = "risk_level";
/// Name of the derived recommendation column
pub const RECOMMENDATION_FIELD: &str = "recommendation";

/// A harmonised layer carrying `exposure_index` and `risk_level`
///
/// The typed vectors mirror the derived columns of `layer` one-to-one, so
/// callers never parse risk levels back out of strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLayer {
    layer: SpatialLayer,
    exposure: Vec<f64>,
    levels: Vec<RiskLevel>,
    breaks: Option<TertileBreaks>,
    recommendations: Option<Vec<String>>,
}

impl ScoredLayer {
    /// Attach tiers to a layer that already holds `exposure_index`
    pub(crate) fn new(
        layer: SpatialLayer,
        exposure: Vec<f64>,
        levels: Vec<RiskLevel>,
        breaks: TertileBreaks,
    ) -> Self {
        let layer = layer.with_column(RISK_LEVEL_FIELD, levels.iter().map(|l| l.as_str()));
        Self {
            layer,
            exposure,
            levels,
            breaks: Some(breaks),
            recommendations: None,
        }
    }

    /// Re-hydrate a previously written risk map
    ///
    /// The cut points of the original batch are not stored in the layer,
    /// so `breaks()` is `None` afterwards.
    ///
    /// # Errors
    /// - `FieldNotFound` if `exposure_index` or `risk_level` is missing
    /// - `NonNumericField` if an exposure value is text
    /// - `InvalidRiskLevel` if a tier is not low, medium or high
    pub fn from_layer(layer: SpatialLayer) -> Result<Self> {
        let exposure = layer
            .numeric_column(EXPOSURE_FIELD, "risk map")?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();

        layer.require_column(RISK_LEVEL_FIELD, "risk map")?;
        let levels = layer
            .features()
            .iter()
            .map(|feature| match feature.get(RISK_LEVEL_FIELD) {
                FieldValue::Text(text) => text.parse(),
                other => Err(RiskError::InvalidRiskLevel {
                    value: format!("{:?}", other),
                }),
            })
            .collect::<Result<Vec<RiskLevel>>>()?;

        let recommendations = if layer.has_column(RECOMMENDATION_FIELD) {
            Some(
                layer
                    .features()
                    .iter()
                    .map(|f| f.get(RECOMMENDATION_FIELD).as_str().unwrap_or_default().to_string())
                    .collect(),
            )
        } else {
            None
        };

        Ok(Self {
            layer,
            exposure,
            levels,
            breaks: None,
            recommendations,
        })
    }

    pub fn layer(&self) -> &SpatialLayer {
        &self.layer
    }

    pub fn into_layer(self) -> SpatialLayer {
        self.layer
    }

    pub fn exposure(&self) -> &[f64] {
        &self.exposure
    }

    pub fn levels(&self) -> &[RiskLevel] {
        &self.levels
    }

    /// Cut points of the batch this map was classified in
    pub fn breaks(&self) -> Option<&TertileBreaks> {
        self.breaks.as_ref()
    }

    /// Present once the adaptation engine has run
    pub fn recommendations(&self) -> Option<&[String]> {
        self.recommendations.as_deref()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Copy with a `recommendation` column
    pub(crate) fn with_recommendations(&self, recommendations: Vec<String>) -> Self {
        let layer = self
            .layer
            .with_column(RECOMMENDATION_FIELD, recommendations.iter().map(String::as_str));
        Self {
            layer,
            exposure: self.exposure.clone(),
            levels: self.levels.clone(),
            breaks: self.breaks,
            recommendations: Some(recommendations),
        }
    }

    pub fn summary(&self) -> RiskSummary {
        let mut counts = [0usize; 3];
        for level in &self.levels {
            counts[level.index()] += 1;
        }
        let mean_exposure = if self.exposure.is_empty() {
            0.0
        } else {
            self.exposure.iter().sum::<f64>() / self.exposure.len() as f64
        };
        RiskSummary {
            total: self.levels.len(),
            low: counts[RiskLevel::Low.index()],
            medium: counts[RiskLevel::Medium.index()],
            high: counts[RiskLevel::High.index()],
            mean_exposure,
            breaks: self.breaks,
        }
    }
}

/// Per-tier counts of a scored layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub mean_exposure: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaks: Option<TertileBreaks>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Crs, Feature, Geometry};

    fn written_map(level: &str) -> SpatialLayer {
        SpatialLayer::from_features(
            Crs::default(),
            vec![Feature::new(Geometry::point(0.0, 0.0))
                .with(EXPOSURE_FIELD, 0.7)
                .with(RISK_LEVEL_FIELD, level)],
        )
    }

    #[test]
    fn test_from_layer_reads_typed_levels() {
        let scored = ScoredLayer::from_layer(written_map("high")).unwrap();
        assert_eq!(scored.levels(), &[RiskLevel::High]);
        assert_eq!(scored.exposure(), &[0.7]);
        assert!(scored.breaks().is_none());
        assert!(scored.recommendations().is_none());
    }

    #[test]
    fn test_from_layer_rejects_unknown_level() {
        let err = ScoredLayer::from_layer(written_map("catastrophic")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RISK_LEVEL");
    }

    #[test]
    fn test_from_layer_requires_risk_level() {
        let layer = SpatialLayer::from_features(
            Crs::default(),
            vec![Feature::new(Geometry::point(0.0, 0.0)).with(EXPOSURE_FIELD, 0.7)],
        );
        let err = ScoredLayer::from_layer(layer).unwrap_err();
        assert!(matches!(err, RiskError::FieldNotFound { ref field, .. } if field == RISK_LEVEL_FIELD));
    }

    #[test]
    fn test_summary_counts() {
        let scored = ScoredLayer::from_layer(written_map("medium")).unwrap();
        let summary = scored.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.low + summary.high, 0);
    }
}
