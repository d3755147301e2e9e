//! Pipeline Tests
//!
//! End-to-end properties of the risk-scoring pipeline.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use floodrisk::layers::{Crs, Feature, FieldValue, Geometry, SpatialLayer};
use floodrisk::scoring::{
    build_risk_map, harmonise, AdaptationEngine, AdaptationRule, OverlayMode, RiskLayerConfig,
    RiskLevel, RiskMapPipeline, FALLBACK_RECOMMENDATION,
};
use floodrisk::RiskError;

/// Helper: one 0.1° cell per value along the diagonal
fn diagonal_layer(columns: &[(&str, &[Option<f64>])]) -> SpatialLayer {
    let rows = columns[0].1.len();
    let features = (0..rows)
        .map(|i| {
            let origin = i as f64;
            columns.iter().fold(
                Feature::new(Geometry::bbox(origin, origin, origin + 0.1, origin + 0.1)),
                |feature, (name, values)| feature.with(name, values[i]),
            )
        })
        .collect();
    SpatialLayer::new(
        Crs::default(),
        columns.iter().map(|(name, _)| name.to_string()).collect(),
        features,
    )
}

fn hazard(values: &[f64]) -> SpatialLayer {
    let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    diagonal_layer(&[("flood_probability", &values)])
}

fn population(values: &[f64]) -> SpatialLayer {
    let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    diagonal_layer(&[("population_density", &values)])
}

fn text_column(layer: &SpatialLayer, name: &str) -> Vec<String> {
    layer
        .features()
        .iter()
        .map(|f| f.get(name).as_str().unwrap_or_default().to_string())
        .collect()
}

// === Reference Scenario ===

#[test]
fn test_reference_scenario() {
    let risk_map = build_risk_map(
        &hazard(&[0.3, 0.6, 0.8]),
        &[population(&[100.0, 450.0, 1000.0])],
        &RiskLayerConfig::default(),
    )
    .unwrap();

    // single weighted field: exposure is the raw value
    assert_eq!(risk_map.exposure(), &[100.0, 450.0, 1000.0]);
    assert_eq!(
        text_column(risk_map.layer(), "risk_level"),
        vec!["low", "medium", "high"]
    );

    // thresholds (0.2..0.5) compare against raw population density, so
    // every tier clears its threshold
    let adapted = AdaptationEngine::default().generate(&risk_map);
    assert_eq!(
        adapted.recommendations().unwrap(),
        &[
            "Prepare community bulletins".to_string(),
            "Activate evacuation shelters".to_string(),
            "Issue evacuation order".to_string(),
        ]
    );
    assert!(risk_map.recommendations().is_none(), "input must stay untouched");
}

#[test]
fn test_output_keeps_geometry_and_fields() {
    let hazard_layer = hazard(&[0.3, 0.6, 0.8]);
    let risk_map = build_risk_map(
        &hazard_layer,
        &[population(&[100.0, 450.0, 1000.0])],
        &RiskLayerConfig::default(),
    )
    .unwrap();

    for (out, input) in risk_map.layer().features().iter().zip(hazard_layer.features()) {
        assert_relative_eq!(out.geometry.area(), input.geometry.area(), epsilon = 1e-12);
        assert_eq!(out.get("flood_probability"), input.get("flood_probability"));
        assert!(matches!(out.get("exposure_index"), FieldValue::Number(_)));
    }
}

// === Determinism ===

#[test]
fn test_build_is_deterministic() {
    let hazard_layer = hazard(&[0.3, 0.6, 0.8, 0.1, 0.9]);
    let vulnerability = [population(&[120.0, 80.0, 640.0, 15.0, 300.0])];
    let config = RiskLayerConfig::default();

    let first = build_risk_map(&hazard_layer, &vulnerability, &config).unwrap();
    let second = build_risk_map(&hazard_layer, &vulnerability, &config).unwrap();

    assert_eq!(first.exposure(), second.exposure());
    assert_eq!(first.levels(), second.levels());
    assert_eq!(first.layer(), second.layer());
}

// === Weight Ordering ===

#[test]
fn test_weights_follow_field_order() {
    let vulnerability = diagonal_layer(&[
        ("population_density", &[Some(0.9), Some(0.1), Some(0.5)]),
        ("elderly_share", &[Some(0.1), Some(0.9), Some(0.5)]),
    ]);
    let hazard_layer = hazard(&[0.3, 0.6, 0.8]);

    let forward = RiskLayerConfig::new(&["flood_probability"], &["population_density", "elderly_share"]);
    let reversed = RiskLayerConfig::new(&["flood_probability"], &["elderly_share", "population_density"]);

    let a = build_risk_map(&hazard_layer, &[vulnerability.clone()], &forward).unwrap();
    let b = build_risk_map(&hazard_layer, &[vulnerability], &reversed).unwrap();

    // (1*0.9 + 2*0.1)/3 vs (1*0.1 + 2*0.9)/3
    assert_relative_eq!(a.exposure()[0], 1.1 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(b.exposure()[0], 1.9 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(a.exposure()[2], b.exposure()[2], epsilon = 1e-12);
    assert_eq!(a.levels()[0], RiskLevel::Low);
    assert_eq!(b.levels()[0], RiskLevel::High);
}

// === Null Handling ===

#[test]
fn test_missing_value_scores_lower() {
    let vulnerability = diagonal_layer(&[
        ("population_density", &[None, Some(200.0), Some(200.0), Some(50.0)]),
        ("elderly_share", &[Some(0.2), Some(0.2), None, Some(0.4)]),
    ]);
    let config = RiskLayerConfig::new(&["flood_probability"], &["population_density", "elderly_share"]);
    let risk_map = build_risk_map(&hazard(&[0.5, 0.5, 0.5, 0.5]), &[vulnerability], &config).unwrap();

    let exposure = risk_map.exposure();
    assert!(exposure[0] < exposure[1], "null density must dilute the index");
    assert!(exposure[2] < exposure[1], "null share must dilute the index");
    assert_relative_eq!(exposure[0], 0.4 / 3.0, epsilon = 1e-12);
}

// === Tertile Partition ===

#[test]
fn test_tertiles_cover_a_third_each() {
    let densities: Vec<f64> = (0..12).map(|i| 10.0 + 37.0 * i as f64).collect();
    let risk_map = build_risk_map(
        &hazard(&vec![0.5; 12]),
        &[population(&densities)],
        &RiskLayerConfig::default(),
    )
    .unwrap();

    for level in RiskLevel::ALL {
        let count = risk_map.levels().iter().filter(|l| **l == level).count();
        assert!((3..=5).contains(&count), "{} covered {} of 12", level, count);
    }
    let summary = risk_map.summary();
    assert_eq!(summary.low + summary.medium + summary.high, 12);
}

#[test]
fn test_too_few_distinct_values() {
    let err = build_risk_map(
        &hazard(&[0.3, 0.6, 0.8]),
        &[population(&[100.0, 100.0, 450.0])],
        &RiskLayerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, RiskError::InsufficientData { distinct: 2, required: 3 }));
}

// === Fallback Recommendation ===

#[test]
fn test_below_threshold_falls_back() {
    let risk_map = build_risk_map(
        &hazard(&[0.3, 0.6, 0.8]),
        &[population(&[0.1, 0.3, 0.45])],
        &RiskLayerConfig::default(),
    )
    .unwrap();
    let adapted = AdaptationEngine::default().generate(&risk_map);

    assert_eq!(
        text_column(adapted.layer(), "recommendation"),
        vec![FALLBACK_RECOMMENDATION; 3]
    );
}

#[test]
fn test_custom_rules_through_pipeline() {
    let engine = AdaptationEngine::new(vec![
        AdaptationRule::new(RiskLevel::High, 500.0, "Issue evacuation order"),
        AdaptationRule::new(RiskLevel::Medium, 400.0, "Activate evacuation shelters"),
    ]);
    let pipeline = RiskMapPipeline::new(RiskLayerConfig::default(), engine);
    let adapted = pipeline
        .build_with_recommendations(&hazard(&[0.3, 0.6, 0.8]), &[population(&[100.0, 450.0, 1000.0])])
        .unwrap();

    assert_eq!(
        adapted.recommendations().unwrap(),
        &[
            FALLBACK_RECOMMENDATION.to_string(),
            "Activate evacuation shelters".to_string(),
            "Issue evacuation order".to_string(),
        ]
    );
}

// === Harmonisation ===

#[test]
fn test_empty_vulnerability_set() {
    let hazard_layer = diagonal_layer(&[
        ("flood_probability", &[Some(0.3), Some(0.6)]),
        ("gauge_id", &[Some(11.0), Some(12.0)]),
    ]);
    let merged = harmonise(
        &hazard_layer,
        &["flood_probability".to_string()],
        &[],
        OverlayMode::Intersection,
    )
    .unwrap();

    assert_eq!(merged.columns(), &["flood_probability".to_string()]);
    let geometries: Vec<&Geometry> = merged.features().iter().map(|f| &f.geometry).collect();
    let expected: Vec<&Geometry> = hazard_layer.features().iter().map(|f| &f.geometry).collect();
    assert_eq!(geometries, expected);
}

#[test]
fn test_hazard_only_scoring_with_empty_vulnerability_set() {
    let config = RiskLayerConfig::new(&["flood_probability"], &["flood_probability"]);
    let risk_map = build_risk_map(&hazard(&[0.3, 0.6, 0.8]), &[], &config).unwrap();
    assert_eq!(risk_map.exposure(), &[0.3, 0.6, 0.8]);
}

#[test]
fn test_crs_mismatch() {
    let projected = SpatialLayer::from_features(
        Crs::new("EPSG:3857"),
        population(&[100.0, 450.0, 1000.0]).features().to_vec(),
    );
    let err = build_risk_map(&hazard(&[0.3, 0.6, 0.8]), &[projected], &RiskLayerConfig::default())
        .unwrap_err();
    assert_eq!(err.error_code(), "CRS_MISMATCH");
}

#[test]
fn test_missing_hazard_field() {
    let config = RiskLayerConfig::new(&["rainfall_mm"], &["population_density"]);
    let err = build_risk_map(&hazard(&[0.3, 0.6, 0.8]), &[population(&[1.0, 2.0, 3.0])], &config)
        .unwrap_err();
    assert!(matches!(err, RiskError::FieldNotFound { ref field, ref layer } if field == "rainfall_mm" && layer == "hazard"));
}

#[test]
fn test_two_vulnerability_layers_fold_in_order() {
    let elderly = diagonal_layer(&[("elderly_share", &[Some(0.1), Some(0.2), Some(0.3)])]);
    let config = RiskLayerConfig::new(&["flood_probability"], &["population_density", "elderly_share"]);
    let risk_map = build_risk_map(
        &hazard(&[0.3, 0.6, 0.8]),
        &[population(&[100.0, 450.0, 1000.0]), elderly],
        &config,
    )
    .unwrap();

    assert_eq!(
        risk_map.layer().columns(),
        &[
            "flood_probability".to_string(),
            "population_density".to_string(),
            "elderly_share".to_string(),
            "exposure_index".to_string(),
            "risk_level".to_string(),
        ]
    );
    assert_relative_eq!(risk_map.exposure()[0], (100.0 + 0.2) / 3.0, epsilon = 1e-9);
}

#[test]
fn test_identity_overlay_dilutes_uncovered_parts() {
    // vulnerability covers only the first two hazard cells
    let config = RiskLayerConfig::default().with_overlay_mode(OverlayMode::Identity);
    let risk_map = build_risk_map(
        &hazard(&[0.3, 0.6, 0.8, 0.9]),
        &[population(&[100.0, 450.0])],
        &config,
    )
    .unwrap();

    assert_eq!(risk_map.len(), 4);
    assert_eq!(risk_map.exposure(), &[100.0, 450.0, 0.0, 0.0]);
    assert_eq!(risk_map.levels()[1], RiskLevel::High);
}

// === Concurrency ===

#[test]
fn test_shared_pipeline_across_threads() {
    let pipeline = RiskMapPipeline::default();
    let expected = pipeline
        .build_with_recommendations(&hazard(&[0.3, 0.6, 0.8]), &[population(&[100.0, 450.0, 1000.0])])
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    pipeline
                        .build_with_recommendations(
                            &hazard(&[0.3, 0.6, 0.8]),
                            &[population(&[100.0, 450.0, 1000.0])],
                        )
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
