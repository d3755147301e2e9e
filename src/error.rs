//! Error handling for Floodrisk
//!
//! The four scoring failures (`FieldNotFound`, `CrsMismatch`,
//! `EmptyWeightFields`, `InsufficientData`) are deterministic input
//! validation errors. They are never retried and propagate unchanged.

use thiserror::Error;

use crate::layers::Crs;

/// Result type alias for Floodrisk operations
pub type Result<T> = std::result::Result<T, RiskError>;

/// Main error type for Floodrisk operations
#[derive(Error, Debug)]
pub enum RiskError {
    // Scoring Errors
    #[error("Field '{field}' not found in {layer} layer")]
    FieldNotFound { field: String, layer: String },

    #[error("CRS mismatch in {layer} layer: expected {expected}, found {found}")]
    CrsMismatch {
        layer: String,
        expected: Crs,
        found: Crs,
    },

    #[error("Exposure scoring needs at least one weight field")]
    EmptyWeightFields,

    #[error("Insufficient data for tertile split: {distinct} distinct exposure values (need {required})")]
    InsufficientData { distinct: usize, required: usize },

    #[error("Field '{field}' holds a non-numeric value at record {index}")]
    NonNumericField { field: String, index: usize },

    #[error("Invalid risk level: '{value}' (expected low, medium or high)")]
    InvalidRiskLevel { value: String },

    // Input Errors
    #[error("Invalid GeoJSON: {reason}")]
    InvalidGeoJson { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RiskError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RiskError::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            RiskError::CrsMismatch { .. } => "CRS_MISMATCH",
            RiskError::EmptyWeightFields => "EMPTY_WEIGHT_FIELDS",
            RiskError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            RiskError::NonNumericField { .. } => "NON_NUMERIC_FIELD",
            RiskError::InvalidRiskLevel { .. } => "INVALID_RISK_LEVEL",
            RiskError::InvalidGeoJson { .. } => "INVALID_GEOJSON",
            RiskError::Config { .. } => "CONFIG_ERROR",
            RiskError::Io(_) => "IO_ERROR",
            RiskError::Json(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True when the caller supplied bad input (a 4xx in a serving layer)
    pub fn is_input_error(&self) -> bool {
        !matches!(self, RiskError::Io(_))
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            RiskError::FieldNotFound { .. } => {
                Some("Check the field names declared in the risk configuration.")
            }
            RiskError::CrsMismatch { .. } => {
                Some("Reproject all layers to the hazard layer's CRS before scoring.")
            }
            RiskError::EmptyWeightFields => {
                Some("Declare at least one vulnerability field to weight.")
            }
            RiskError::InsufficientData { .. } => {
                Some("Score a larger area so at least three distinct exposure values exist.")
            }
            RiskError::InvalidRiskLevel { .. } => {
                Some("Rebuild the risk map; risk_level must be low, medium or high.")
            }
            _ => None,
        }
    }
}
