//! Layer Harmoniser
//!
//! Left-folds a geometric overlay of the hazard layer with each
//! vulnerability layer in sequence order. Each step emits one feature per
//! overlapping geometry pair and carries the attributes of both sides.
//!
//! Field names of the accumulated layer never change. An incoming field
//! whose name is already taken is renamed `<name>_<k>`, where `k` is the
//! 1-based position of the vulnerability layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::layers::{Feature, FieldValue, Geometry, SpatialLayer};

/// Set operation applied at each overlay step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Pairwise intersections only
    #[default]
    Intersection,
    /// Intersections plus uncovered parts of the accumulated layer
    Identity,
    /// Identity plus uncovered parts of the incoming layer
    Union,
    /// Uncovered parts of both sides
    SymmetricDifference,
    /// Uncovered parts of the accumulated layer; incoming fields dropped
    Difference,
}

impl OverlayMode {
    fn keeps_intersections(self) -> bool {
        matches!(
            self,
            OverlayMode::Intersection | OverlayMode::Identity | OverlayMode::Union
        )
    }

    fn keeps_left_remainder(self) -> bool {
        !matches!(self, OverlayMode::Intersection)
    }

    fn keeps_right_remainder(self) -> bool {
        matches!(self, OverlayMode::Union | OverlayMode::SymmetricDifference)
    }
}

/// Overlay the hazard layer with every vulnerability layer
///
/// The hazard layer is first restricted to `hazard_fields`; with no
/// vulnerability layers that restriction is the result. Inputs are never
/// mutated.
///
/// # Errors
/// - `FieldNotFound` if a declared hazard field is missing
/// - `CrsMismatch` if a vulnerability layer's CRS differs from the hazard's
pub fn harmonise(
    hazard: &SpatialLayer,
    hazard_fields: &[String],
    vulnerability_layers: &[SpatialLayer],
    mode: OverlayMode,
) -> Result<SpatialLayer> {
    let restricted = hazard.select(hazard_fields, "hazard")?;

    for (index, layer) in vulnerability_layers.iter().enumerate() {
        if layer.crs() != restricted.crs() {
            return Err(RiskError::CrsMismatch {
                layer: vulnerability_label(index),
                expected: restricted.crs().clone(),
                found: layer.crs().clone(),
            });
        }
    }

    let merged = vulnerability_layers
        .iter()
        .enumerate()
        .fold(restricted, |accumulated, (index, layer)| {
            overlay(&accumulated, layer, index + 1, mode)
        });
    Ok(merged)
}

fn vulnerability_label(index: usize) -> String {
    format!("vulnerability[{}]", index)
}

/// One overlay step; `position` is the 1-based index of `right`
fn overlay(left: &SpatialLayer, right: &SpatialLayer, position: usize, mode: OverlayMode) -> SpatialLayer {
    let renames = incoming_names(left.columns(), right.columns(), position);

    let mut columns = left.columns().to_vec();
    if mode != OverlayMode::Difference {
        columns.extend(renames.iter().map(|(_, name)| name.clone()));
    }
    let mut merged = SpatialLayer::new(left.crs().clone(), columns, Vec::new());

    if mode.keeps_intersections() {
        for l in left.features() {
            for r in right.features() {
                if let Some(geometry) = l.geometry.intersection(&r.geometry) {
                    let mut properties = l.properties.clone();
                    properties.extend(renamed(&r.properties, &renames));
                    merged.push(Feature { geometry, properties });
                }
            }
        }
    }

    if mode.keeps_left_remainder() {
        let covering: Vec<&Geometry> = right.features().iter().map(|f| &f.geometry).collect();
        for l in left.features() {
            if let Some(geometry) = l.geometry.difference_all(covering.iter().copied()) {
                merged.push(Feature {
                    geometry,
                    properties: l.properties.clone(),
                });
            }
        }
    }

    if mode.keeps_right_remainder() {
        let covering: Vec<&Geometry> = left.features().iter().map(|f| &f.geometry).collect();
        for r in right.features() {
            if let Some(geometry) = r.geometry.difference_all(covering.iter().copied()) {
                merged.push(Feature {
                    geometry,
                    properties: renamed(&r.properties, &renames),
                });
            }
        }
    }

    merged
}

/// `(incoming, output)` name pairs in incoming schema order, suffixing on collision
fn incoming_names(existing: &[String], incoming: &[String], position: usize) -> Vec<(String, String)> {
    let mut taken: Vec<String> = existing.to_vec();
    let mut names = Vec::with_capacity(incoming.len());
    for column in incoming {
        let mut name = column.clone();
        while taken.contains(&name) {
            name = format!("{}_{}", name, position);
        }
        taken.push(name.clone());
        names.push((column.clone(), name));
    }
    names
}

fn renamed(
    properties: &BTreeMap<String, FieldValue>,
    renames: &[(String, String)],
) -> BTreeMap<String, FieldValue> {
    properties
        .iter()
        .map(|(key, value)| {
            let name = renames
                .iter()
                .find(|(column, _)| column == key)
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| key.clone());
            (name, value.clone())
        })
        .collect()
}
