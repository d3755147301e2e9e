//! Spatial layers: a CRS-tagged, ordered collection of features

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{FieldValue, Geometry};
use crate::error::{Result, RiskError};

/// WGS 84, the GeoJSON default
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Coordinate reference system identifier
///
/// Stored normalized (`AUTHORITY:CODE`, upper-case authority) so layers
/// from different loaders compare equal when they name the same system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub fn new(identifier: &str) -> Self {
        Crs(normalize_crs(identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs(DEFAULT_CRS.to_string())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Crs {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(RiskError::Config {
                reason: "empty CRS identifier".to_string(),
            });
        }
        Ok(Crs::new(s))
    }
}

impl TryFrom<String> for Crs {
    type Error = RiskError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.0
    }
}

/// `urn:ogc:def:crs:EPSG::4326` and `epsg:4326` both become `EPSG:4326`
///
/// OGC CRS84 is WGS 84 lon/lat, the axis order GeoJSON already uses, so it
/// folds into `EPSG:4326` too.
fn normalize_crs(identifier: &str) -> String {
    let normalized = authority_code(identifier.trim());
    if normalized.eq_ignore_ascii_case("OGC:CRS84") || normalized.eq_ignore_ascii_case("CRS84") {
        DEFAULT_CRS.to_string()
    } else {
        normalized
    }
}

fn authority_code(trimmed: &str) -> String {
    let lower = trimmed.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("urn:ogc:def:crs:") {
        let parts: Vec<&str> = rest.split(':').filter(|p| !p.is_empty()).collect();
        if let [authority, .., code] = parts.as_slice() {
            return format!("{}:{}", authority.to_ascii_uppercase(), code.to_ascii_uppercase());
        }
    }
    match trimmed.split_once(':') {
        Some((authority, code)) => format!("{}:{}", authority.to_ascii_uppercase(), code.trim()),
        None => trimmed.to_string(),
    }
}

/// One record of a layer: a geometry plus named attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: BTreeMap<String, FieldValue>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Attribute value; absent keys read as null
    pub fn get(&self, name: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.properties.get(name).unwrap_or(&NULL)
    }
}

/// An ordered collection of features sharing one CRS
///
/// `columns` is the layer schema. Features may leave any column unset,
/// which reads as null.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialLayer {
    crs: Crs,
    columns: Vec<String>,
    features: Vec<Feature>,
}

impl SpatialLayer {
    /// Create a layer with a declared schema
    ///
    /// Property keys used by features but missing from `columns` are
    /// appended to the schema in first-seen order.
    pub fn new(crs: Crs, columns: Vec<String>, features: Vec<Feature>) -> Self {
        let mut layer = Self {
            crs,
            columns: Vec::with_capacity(columns.len()),
            features: Vec::new(),
        };
        for column in columns {
            layer.add_column(&column);
        }
        for feature in features {
            layer.push(feature);
        }
        layer
    }

    /// Create a layer whose schema is inferred from its features
    pub fn from_features(crs: Crs, features: Vec<Feature>) -> Self {
        Self::new(crs, Vec::new(), features)
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Append a feature, extending the schema with unseen keys
    pub fn push(&mut self, feature: Feature) {
        for key in feature.properties.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.features.push(feature);
    }

    fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Fail with `FieldNotFound` unless `name` is in the schema
    pub fn require_column(&self, name: &str, layer: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(RiskError::FieldNotFound {
                field: name.to_string(),
                layer: layer.to_string(),
            })
        }
    }

    /// New layer restricted to `fields` (plus geometry), in `fields` order
    pub fn select(&self, fields: &[String], layer: &str) -> Result<SpatialLayer> {
        for field in fields {
            self.require_column(field, layer)?;
        }
        let features = self
            .features
            .iter()
            .map(|feature| Feature {
                geometry: feature.geometry.clone(),
                properties: feature
                    .properties
                    .iter()
                    .filter(|(key, _)| fields.contains(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            })
            .collect();
        Ok(SpatialLayer::new(self.crs.clone(), fields.to_vec(), features))
    }

    /// Numeric values of a column, nulls reported as `None`
    ///
    /// Text values fail with `NonNumericField`.
    pub fn numeric_column(&self, name: &str, layer: &str) -> Result<Vec<Option<f64>>> {
        self.require_column(name, layer)?;
        self.features
            .iter()
            .enumerate()
            .map(|(index, feature)| match feature.get(name) {
                value if value.is_null() => Ok(None),
                value => value.as_f64().map(Some).ok_or_else(|| RiskError::NonNumericField {
                    field: name.to_string(),
                    index,
                }),
            })
            .collect()
    }

    /// New layer with `name` set from `values`, overwriting any existing column
    ///
    /// `values` must hold exactly one entry per feature.
    pub fn with_column<I, V>(&self, name: &str, values: I) -> SpatialLayer
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let values: Vec<FieldValue> = values.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            values.len(),
            self.features.len(),
            "column {} needs one value per feature",
            name
        );
        let mut layer = self.clone();
        layer.add_column(name);
        for (feature, value) in layer.features.iter_mut().zip(values) {
            feature.properties.insert(name.to_string(), value);
        }
        layer
    }
}
