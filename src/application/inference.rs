//! Prediction service: Orchestrates the readmission scoring pipeline.
//!
//! This service coordinates:
//! - Feature alignment against the training schema
//! - Model scoring
//! - Threshold classification and tiering
//! - Report assembly for the presentation layer

use std::sync::Arc;

use crate::application::{align, classify, ModelArtifacts};
use crate::config::PredictionConfig;
use crate::domain::{PatientInput, PredictionReport};
use crate::ports::{FeatureScaler, ReadmissionModel};
use crate::ReadmitError;

/// Stateless per-request prediction pipeline over shared, read-only artifacts.
pub struct PredictionService<M, S>
where
    M: ReadmissionModel,
    S: FeatureScaler,
{
    artifacts: Arc<ModelArtifacts<M, S>>,
    config: PredictionConfig,
}

impl<M, S> PredictionService<M, S>
where
    M: ReadmissionModel,
    S: FeatureScaler,
{
    /// Create a new prediction service.
    ///
    /// # Errors
    /// Returns `ReadmitError::Config` if the prediction settings are invalid.
    pub fn new(
        artifacts: Arc<ModelArtifacts<M, S>>,
        config: PredictionConfig,
    ) -> Result<Self, ReadmitError> {
        config.validate()?;
        tracing::info!(
            "Prediction service ready (threshold={}, n_features={})",
            config.threshold,
            artifacts.schema().len()
        );
        Ok(Self { artifacts, config })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    #[must_use]
    pub fn artifacts(&self) -> &Arc<ModelArtifacts<M, S>> {
        &self.artifacts
    }

    /// Run the full pipeline for one patient.
    ///
    /// Each call is independent; a failure affects only this request.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` or `ModelInvocation` if alignment or scoring fails.
    pub fn predict(&self, input: &PatientInput) -> Result<PredictionReport, ReadmitError> {
        let outcome = align(input, self.artifacts.schema(), self.artifacts.scaler())
            .and_then(|vector| classify(&vector, self.artifacts.model(), self.config.threshold));

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Prediction failed: {e}");
                return Err(e);
            }
        };

        let report = PredictionReport::new(
            result,
            self.config.threshold,
            self.config.display_confidence_pct,
        );

        tracing::info!(
            "Prediction complete: id={}, prediction={}, probability={:.1}%, risk={}",
            report.id,
            report.result.predicted_class,
            report.probability_pct,
            report.result.risk_tier
        );

        Ok(report)
    }
}
