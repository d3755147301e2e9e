//! Risk Scoring Module
//!
//! Harmoniser → Exposure Scorer → Risk Classifier → Adaptation Engine.
//! Every stage is a pure transformation: inputs are borrowed, outputs are
//! freshly built layers.

mod adaptation;
mod classify;
mod exposure;
mod harmonise;
mod pipeline;
mod scored;

pub use adaptation::{default_rules, AdaptationEngine, AdaptationRule, FALLBACK_RECOMMENDATION};
pub use classify::{classify, RiskLevel, TertileBreaks, MIN_DISTINCT_VALUES};
pub use exposure::{exposure_values, exposure_weights, score, EXPOSURE_FIELD};
pub use harmonise::{harmonise, OverlayMode};
pub use pipeline::{build_risk_map, RiskLayerConfig, RiskMapPipeline};
pub use scored::{RiskSummary, ScoredLayer, RECOMMENDATION_FIELD, RISK_LEVEL_FIELD};
