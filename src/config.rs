//! Settings
//!
//! Loaded once at process start from a JSON file and passed by reference
//! to whatever needs it. There is no process-wide cached instance.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::scoring::{default_rules, AdaptationEngine, AdaptationRule, RiskLayerConfig, RiskMapPipeline};

/// Top-level settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Fields and overlay mode used by the pipeline.
    #[serde(default)]
    pub risk: RiskLayerConfig,

    /// Adaptation rule table.
    #[serde(default)]
    pub adaptation: AdaptationSettings,

    /// Output formatting.
    #[serde(default)]
    pub output: OutputSettings,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationSettings {
    #[serde(default = "default_rules")]
    pub rules: Vec<AdaptationRule>,
}

impl Default for AdaptationSettings {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print written feature collections.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations that can never score
    pub fn validate(&self) -> Result<()> {
        if self.risk.vulnerability_fields.is_empty() {
            return Err(RiskError::Config {
                reason: "risk.vulnerability_fields must name at least one field".to_string(),
            });
        }
        if let Some(rule) = self
            .adaptation
            .rules
            .iter()
            .find(|rule| !rule.exposure_threshold.is_finite())
        {
            return Err(RiskError::Config {
                reason: format!("non-finite threshold for {} rule", rule.risk_level),
            });
        }
        Ok(())
    }

    pub fn adaptation_engine(&self) -> AdaptationEngine {
        AdaptationEngine::new(self.adaptation.rules.iter().cloned())
    }

    pub fn pipeline(&self) -> RiskMapPipeline {
        RiskMapPipeline::new(self.risk.clone(), self.adaptation_engine())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
