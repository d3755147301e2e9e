//! Floodrisk - Flood Risk Scoring
//!
//! Combines hazard forecasts (e.g. flood probability) with vulnerability
//! layers (e.g. population density) into a spatial risk score, buckets the
//! score into risk tiers and maps tiers to adaptation recommendations.
//!
//! # Architecture
//!
//! The scoring pipeline runs four pure stages:
//! - Harmoniser: overlay hazard and vulnerability layers
//! - Exposure Scorer: positional weighted mean of vulnerability fields
//! - Risk Classifier: batch-relative tertiles (`low`, `medium`, `high`)
//! - Adaptation Engine: tier + exposure to a recommended action
//!
//! `io` and `cli` are the thin edges around it.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod layers;
pub mod scoring;

pub use config::Settings;
pub use error::{Result, RiskError};
pub use scoring::{build_risk_map, AdaptationEngine, RiskLayerConfig, RiskLevel, ScoredLayer};
