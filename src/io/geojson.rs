//! GeoJSON feature collections
//!
//! Reads vector layers for the pipeline and writes scored layers back out
//! as flat `geometry + properties` features. Supported geometry types are
//! Point, Polygon and MultiPolygon. The legacy `crs` member names the
//! layer CRS; without it a collection is `EPSG:4326`. Nested array or
//! object properties are kept as their JSON text.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, RiskError};
use crate::layers::{Crs, Feature, FieldValue, Geometry, SpatialLayer};

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    crs: Option<NamedCrs>,
    #[serde(default)]
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrs {
    #[serde(rename = "type")]
    kind: String,
    properties: NamedCrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FeatureDoc {
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryDoc {
    Point(Position),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Parse a FeatureCollection document into a layer
pub fn parse_layer(content: &str) -> Result<SpatialLayer> {
    let doc: FeatureCollectionDoc = serde_json::from_str(content)?;
    if doc.kind != "FeatureCollection" {
        return Err(RiskError::InvalidGeoJson {
            reason: format!("expected a FeatureCollection, found {}", doc.kind),
        });
    }

    let crs = match doc.crs {
        Some(named) => named.properties.name.parse()?,
        None => Crs::default(),
    };

    let mut layer = SpatialLayer::new(crs, Vec::new(), Vec::new());
    for (index, feature) in doc.features.into_iter().enumerate() {
        let geometry = feature.geometry.ok_or_else(|| RiskError::InvalidGeoJson {
            reason: format!("feature {} has no geometry", index),
        })?;
        let properties = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, field_from_json(value)))
            .collect();
        layer.push(Feature {
            geometry: parse_geometry(geometry, index)?,
            properties,
        });
    }
    Ok(layer)
}

/// Read a layer from a GeoJSON file
pub fn read_layer(path: &Path) -> Result<SpatialLayer> {
    let content = fs::read_to_string(path)?;
    let layer = parse_layer(&content)?;
    debug!(
        "Loaded {} features ({}) from {}",
        layer.len(),
        layer.crs(),
        path.display()
    );
    Ok(layer)
}

/// Layer as a FeatureCollection value
///
/// Every schema column appears in every feature's properties; unset
/// values are written as null.
pub fn to_feature_collection(layer: &SpatialLayer) -> Value {
    let features: Vec<Value> = layer
        .features()
        .iter()
        .map(|feature| {
            let properties: serde_json::Map<String, Value> = layer
                .columns()
                .iter()
                .map(|column| (column.clone(), field_to_json(feature.get(column))))
                .collect();
            json!({
                "type": "Feature",
                "geometry": from_geometry(&feature.geometry),
                "properties": properties,
            })
        })
        .collect();

    let crs = NamedCrs {
        kind: "name".to_string(),
        properties: NamedCrsProperties {
            name: layer.crs().to_string(),
        },
    };
    json!({
        "type": "FeatureCollection",
        "crs": crs,
        "features": features,
    })
}

/// Write a layer as a GeoJSON file
pub fn write_layer(path: &Path, layer: &SpatialLayer, pretty: bool) -> Result<()> {
    let collection = to_feature_collection(layer);
    let content = if pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };
    fs::write(path, content)?;
    debug!("Wrote {} features to {}", layer.len(), path.display());
    Ok(())
}

fn field_from_json(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
        Value::String(s) => FieldValue::Text(s),
        nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Text(nested.to_string()),
    }
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Null => Value::Null,
    }
}

fn to_coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(RiskError::InvalidGeoJson {
            reason: format!("position needs at least 2 ordinates, found {}", position.len()),
        }),
    }
}

fn to_polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| to_coord(p))
                .collect::<Result<Vec<Coord<f64>>>>()
                .map(LineString::new)
        })
        .collect::<Result<Vec<LineString<f64>>>>()?;
    if rings.is_empty() {
        return Err(RiskError::InvalidGeoJson {
            reason: "polygon has no exterior ring".to_string(),
        });
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn parse_geometry(value: Value, index: usize) -> Result<Geometry> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("untyped").to_string();
    let doc: GeometryDoc = serde_json::from_value(value).map_err(|e| RiskError::InvalidGeoJson {
        reason: format!("feature {} has unsupported {} geometry: {}", index, kind, e),
    })?;
    to_geometry(doc)
}

fn to_geometry(doc: GeometryDoc) -> Result<Geometry> {
    match doc {
        GeometryDoc::Point(position) => Ok(Geometry::Point(Point::from(to_coord(&position)?))),
        GeometryDoc::Polygon(rings) => Ok(Geometry::from(to_polygon(&rings)?)),
        GeometryDoc::MultiPolygon(polygons) => {
            let parts = polygons
                .iter()
                .map(|rings| to_polygon(rings))
                .collect::<Result<Vec<Polygon<f64>>>>()?;
            Ok(Geometry::Polygon(MultiPolygon::new(parts)))
        }
    }
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Position> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_positions)
        .collect()
}

fn from_geometry(geometry: &Geometry) -> GeometryDoc {
    match geometry {
        Geometry::Point(p) => GeometryDoc::Point(vec![p.x(), p.y()]),
        Geometry::Polygon(mp) if mp.0.len() == 1 => GeometryDoc::Polygon(polygon_rings(&mp.0[0])),
        Geometry::Polygon(mp) => GeometryDoc::MultiPolygon(mp.0.iter().map(polygon_rings).collect()),
    }
}
