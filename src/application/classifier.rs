//! Risk classification of a single model probability.

use crate::domain::{AlignedFeatureVector, PredictionResult};
use crate::ports::{ModelError, ReadmissionModel};
use crate::ReadmitError;

/// Score an aligned row and assign its class and risk tier.
///
/// One synchronous model call; no retries.
///
/// # Errors
/// Returns `ModelInvocation` if the model fails or returns a probability
/// that is not a finite value in [0, 1].
pub fn classify<M>(
    vector: &AlignedFeatureVector,
    model: &M,
    threshold: f64,
) -> Result<PredictionResult, ReadmitError>
where
    M: ReadmissionModel + ?Sized,
{
    let probability = model.predict_proba(vector)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(ModelError::InvalidProbability(probability).into());
    }

    let result = PredictionResult::new(probability, threshold);
    tracing::debug!(
        "Classified probability={probability:.4} threshold={threshold} class={} tier={}",
        result.predicted_class,
        result.risk_tier
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureSchema, RiskTier};

    struct FixedModel(f64);

    impl ReadmissionModel for FixedModel {
        fn predict_proba(&self, _features: &AlignedFeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    struct FailingModel;

    impl ReadmissionModel for FailingModel {
        fn predict_proba(&self, _features: &AlignedFeatureVector) -> Result<f64, ModelError> {
            Err(ModelError::Invocation("backend unavailable".into()))
        }
    }

    fn vector() -> AlignedFeatureVector {
        FeatureSchema::new(vec!["age".into()])
            .expect("schema")
            .project(vec![("age".to_string(), 50.0)])
    }

    #[test]
    fn test_probability_at_threshold_is_moderate() {
        let result = classify(&vector(), &FixedModel(0.31), 0.31).expect("classify");
        assert_eq!(result.predicted_class, 1);
        assert_eq!(result.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn test_high_and_low() {
        let high = classify(&vector(), &FixedModel(0.75), 0.31).expect("classify");
        assert_eq!(high.risk_tier, RiskTier::High);

        let low = classify(&vector(), &FixedModel(0.05), 0.31).expect("classify");
        assert_eq!(low.predicted_class, 0);
        assert_eq!(low.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_threshold_is_injectable() {
        let result = classify(&vector(), &FixedModel(0.4), 0.5).expect("classify");
        assert_eq!(result.predicted_class, 0);
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        for bad in [1.2, -0.01, f64::NAN, f64::INFINITY] {
            let err = classify(&vector(), &FixedModel(bad), 0.31).expect_err("must fail");
            assert!(matches!(
                err,
                ReadmitError::ModelInvocation(ModelError::InvalidProbability(_))
            ));
        }
    }

    #[test]
    fn test_model_failure_is_model_invocation_error() {
        let err = classify(&vector(), &FailingModel, 0.31).expect_err("must fail");
        assert!(err.is_per_request());
        assert!(err.to_string().contains("backend unavailable"));
    }
}
