//! Layer Model Module
//!
//! Spatial data consumed and produced by the scoring pipeline:
//! - Geometry: points and (multi-)polygons with overlay set operations
//! - FieldValue: scalar feature attributes
//! - SpatialLayer: CRS-tagged ordered features with a column schema

mod field;
mod geometry;
mod spatial;

pub use field::FieldValue;
pub use geometry::Geometry;
pub use spatial::{Crs, Feature, SpatialLayer, DEFAULT_CRS};
