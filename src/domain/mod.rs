//! Domain layer: Core business types and logic.
//!
//! Pure types for patient input, the training-time feature schema, and
//! prediction results. No I/O happens here.

mod patient;
mod prediction;
mod schema;

pub use patient::{AdmissionType, Categorical, DischargeDisposition, PatientInput, NUMERIC_FEATURES};
pub use prediction::{probability_pct, PredictionReport, PredictionResult, RiskTier, HIGH_RISK_PCT};
pub use schema::{AlignedFeatureVector, FeatureSchema, SchemaError};
