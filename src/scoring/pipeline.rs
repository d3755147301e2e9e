//! Risk Map Pipeline
//!
//! Stages run in a fixed order with no skipping:
//! 1. Harmonise (overlay hazard with vulnerability layers)
//! 2. Score (weighted exposure index)
//! 3. Classify (batch tertiles)
//! 4. Adapt (optional, recommendations)
//!
//! Errors from any stage are returned unchanged.

use serde::{Deserialize, Serialize};

use super::adaptation::AdaptationEngine;
use super::classify::classify;
use super::exposure::{exposure_values, EXPOSURE_FIELD};
use super::harmonise::{harmonise, OverlayMode};
use super::scored::ScoredLayer;
use crate::error::Result;
use crate::layers::SpatialLayer;

/// Fields taking part in scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLayerConfig {
    /// Hazard fields kept through the overlay
    pub hazard_fields: Vec<String>,
    /// Vulnerability fields weighted `1..=n` in this order
    pub vulnerability_fields: Vec<String>,
    #[serde(default)]
    pub overlay_mode: OverlayMode,
}

impl RiskLayerConfig {
    pub fn new(hazard_fields: &[&str], vulnerability_fields: &[&str]) -> Self {
        Self {
            hazard_fields: hazard_fields.iter().map(|f| f.to_string()).collect(),
            vulnerability_fields: vulnerability_fields.iter().map(|f| f.to_string()).collect(),
            overlay_mode: OverlayMode::default(),
        }
    }

    pub fn with_overlay_mode(mut self, mode: OverlayMode) -> Self {
        self.overlay_mode = mode;
        self
    }
}

impl Default for RiskLayerConfig {
    fn default() -> Self {
        Self::new(&["flood_probability"], &["population_density"])
    }
}

/// Combine hazard and vulnerability layers into a scored risk map
///
/// Deterministic: identical inputs give an identical layer, row order
/// included.
pub fn build_risk_map(
    hazard: &SpatialLayer,
    vulnerability_layers: &[SpatialLayer],
    config: &RiskLayerConfig,
) -> Result<ScoredLayer> {
    let merged = harmonise(
        hazard,
        &config.hazard_fields,
        vulnerability_layers,
        config.overlay_mode,
    )?;
    let exposure = exposure_values(&merged, &config.vulnerability_fields)?;
    let (breaks, levels) = classify(&exposure)?;
    let scored = merged.with_column(EXPOSURE_FIELD, exposure.iter().copied());
    Ok(ScoredLayer::new(scored, exposure, levels, breaks))
}

/// Pipeline bound to one configuration and rule table
///
/// Built once at startup and shared by reference; it holds no mutable
/// state.
#[derive(Debug, Clone, Default)]
pub struct RiskMapPipeline {
    config: RiskLayerConfig,
    engine: AdaptationEngine,
}

impl RiskMapPipeline {
    pub fn new(config: RiskLayerConfig, engine: AdaptationEngine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &RiskLayerConfig {
        &self.config
    }

    pub fn engine(&self) -> &AdaptationEngine {
        &self.engine
    }

    pub fn build(&self, hazard: &SpatialLayer, vulnerability_layers: &[SpatialLayer]) -> Result<ScoredLayer> {
        build_risk_map(hazard, vulnerability_layers, &self.config)
    }

    pub fn build_with_recommendations(
        &self,
        hazard: &SpatialLayer,
        vulnerability_layers: &[SpatialLayer],
    ) -> Result<ScoredLayer> {
        let scored = self.build(hazard, vulnerability_layers)?;
        Ok(self.engine.generate(&scored))
    }
}
