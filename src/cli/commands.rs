//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use crate::config::Settings;
use crate::io::geojson;
use crate::layers::{Crs, Feature, Geometry, SpatialLayer};
use crate::scoring::{RiskSummary, ScoredLayer};

/// Load settings from `path`, or the defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            info!("Loading settings: {}", path.display());
            Settings::load(path).with_context(|| format!("loading settings from {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}

/// Score hazard and vulnerability layers.
pub fn build(
    settings: &Settings,
    hazard: &Path,
    vulnerability: &[PathBuf],
    output: Option<&Path>,
    adapt: bool,
) -> Result<()> {
    info!(
        "Building risk map: hazard {} with {} vulnerability layer(s)",
        hazard.display(),
        vulnerability.len()
    );

    let hazard_layer = geojson::read_layer(hazard)
        .with_context(|| format!("reading hazard layer {}", hazard.display()))?;
    let vulnerability_layers = vulnerability
        .iter()
        .map(|path| {
            geojson::read_layer(path)
                .with_context(|| format!("reading vulnerability layer {}", path.display()))
        })
        .collect::<Result<Vec<SpatialLayer>>>()?;

    let risk_map = run(settings, &hazard_layer, &vulnerability_layers, adapt)?;
    emit(settings, &risk_map, output)
}

/// Attach recommendations to a stored risk map.
pub fn recommend(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<()> {
    info!("Generating recommendations for: {}", input.display());

    let layer = geojson::read_layer(input)
        .with_context(|| format!("reading risk map {}", input.display()))?;
    let risk_map = ScoredLayer::from_layer(layer)
        .with_context(|| format!("{} is not a scored risk map", input.display()))?;
    if risk_map.recommendations().is_some() {
        warn!("Replacing existing recommendations in {}", input.display());
    }

    let adapted = settings.adaptation_engine().generate(&risk_map);
    emit(settings, &adapted, output)
}

/// Score the sample basin served by the reference API.
pub fn demo(settings: &Settings, adapt: bool) -> Result<()> {
    info!("Scoring built-in sample basin");
    let (hazard, vulnerability) = sample_basin();
    let risk_map = run(settings, &hazard, &vulnerability, adapt)?;
    emit(settings, &risk_map, None)
}

/// Print the effective settings.
pub fn show_config(settings: &Settings) -> Result<()> {
    println!("{}", settings.to_json_pretty()?);
    Ok(())
}

/// Three 0.1° cells along the diagonal with rising hazard and density.
pub fn sample_basin() -> (SpatialLayer, Vec<SpatialLayer>) {
    let cell = |i: usize| {
        let origin = i as f64;
        Geometry::bbox(origin, origin, origin + 0.1, origin + 0.1)
    };
    let hazard = SpatialLayer::from_features(
        Crs::default(),
        [0.3, 0.6, 0.8]
            .iter()
            .enumerate()
            .map(|(i, p)| Feature::new(cell(i)).with("flood_probability", *p))
            .collect(),
    );
    let population = SpatialLayer::from_features(
        Crs::default(),
        [100.0, 450.0, 1000.0]
            .iter()
            .enumerate()
            .map(|(i, d)| Feature::new(cell(i)).with("population_density", *d))
            .collect(),
    );
    (hazard, vec![population])
}

fn run(
    settings: &Settings,
    hazard: &SpatialLayer,
    vulnerability: &[SpatialLayer],
    adapt: bool,
) -> Result<ScoredLayer> {
    let pipeline = settings.pipeline();
    let risk_map = if adapt {
        pipeline.build_with_recommendations(hazard, vulnerability)
    } else {
        pipeline.build(hazard, vulnerability)
    }
    .context("scoring risk map")?;

    log_summary(&risk_map.summary());
    Ok(risk_map)
}

fn log_summary(summary: &RiskSummary) {
    info!(
        "Scored {} areas: {} low, {} medium, {} high (mean exposure {:.3})",
        summary.total, summary.low, summary.medium, summary.high, summary.mean_exposure
    );
    if let Some(breaks) = &summary.breaks {
        info!(
            "Tertile cut points: {:.3} / {:.3} (range {:.3}..{:.3})",
            breaks.lower, breaks.upper, breaks.min, breaks.max
        );
    }
}

fn emit(settings: &Settings, risk_map: &ScoredLayer, output: Option<&Path>) -> Result<()> {
    let pretty = settings.output.pretty;
    match output {
        Some(path) => {
            geojson::write_layer(path, risk_map.layer(), pretty)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Risk map written: {}", path.display());
        }
        None => {
            let mut collection = geojson::to_feature_collection(risk_map.layer());
            collection["generated_at"] = serde_json::Value::String(Utc::now().to_rfc3339());
            let content = if pretty {
                serde_json::to_string_pretty(&collection)?
            } else {
                serde_json::to_string(&collection)?
            };
            println!("{}", content);
        }
    }
    Ok(())
}
