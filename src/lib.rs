//! # Readmit
//!
//! 30-day hospital readmission risk estimation from a pre-trained model.
//!
//! This crate provides:
//! - Alignment of patient input onto the model's training-time feature schema
//! - Threshold-based classification into Low / Moderate / High risk tiers
//! - Loading and integrity verification of the model, scaler and column artifacts
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientInput, FeatureSchema, PredictionResult)
//! - `ports`: Trait definitions for the model and scaler
//! - `adapters`: Concrete implementations (JSON artifacts, log sanitization)
//! - `application`: The prediction pipeline orchestrating domain and ports
//! - `config`: Environment-driven runtime configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PatientInput, PredictionReport, PredictionResult, RiskTier};

/// Result type for Readmit operations
pub type Result<T> = std::result::Result<T, ReadmitError>;

/// Main error type for Readmit
#[derive(Debug, thiserror::Error)]
pub enum ReadmitError {
    #[error("Model artifacts not found: {}", .0.join(", "))]
    MissingArtifacts(Vec<String>),

    #[error("Failed to load {artifact}: {reason}")]
    ArtifactLoad { artifact: String, reason: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] domain::SchemaError),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(#[from] ports::ModelError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReadmitError {
    /// Whether the error concerns one request only; all others block serving.
    #[must_use]
    pub fn is_per_request(&self) -> bool {
        matches!(self, Self::ModelInvocation(_) | Self::Validation(_))
    }
}
