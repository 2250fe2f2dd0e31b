//! Model ports: Traits for the pre-trained scoring artifacts.
//!
//! These traits abstract the concrete artifact formats from the prediction
//! pipeline, so the aligner and classifier can be exercised with stub models.

use crate::domain::AlignedFeatureVector;

/// Failure while invoking a model or scaler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("expected {expected} input values, got {found}")]
    InputLength { expected: usize, found: usize },

    #[error("model returned invalid probability {0}")]
    InvalidProbability(f64),

    #[error("non-finite value produced for column '{0}'")]
    NonFinite(String),

    #[error("model invocation failed: {0}")]
    Invocation(String),
}

/// Binary classifier scoring readmission.
pub trait ReadmissionModel: Send + Sync {
    /// Probability of the positive (readmitted) class for one aligned row.
    ///
    /// # Errors
    /// Returns `ModelError` if the row cannot be scored.
    fn predict_proba(&self, features: &AlignedFeatureVector) -> Result<f64, ModelError>;
}

/// Fitted numeric scaler applied to a subset of the feature columns.
pub trait FeatureScaler: Send + Sync {
    /// Columns the scaler was fitted on, in the order `transform` expects.
    fn feature_names(&self) -> &[String];

    /// Scale one row of values ordered as `feature_names()`.
    ///
    /// # Errors
    /// Returns `ModelError::InputLength` if `values` has the wrong length.
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError>;
}
