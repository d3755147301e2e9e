//! I/O Module
//!
//! File formats at the edge of the pipeline. The scoring core never
//! touches the filesystem.

pub mod geojson;

pub use geojson::{parse_layer, read_layer, to_feature_collection, write_layer};
