//! Prediction result types.
//!
//! Represents the output of scoring one patient against the readmission model.

use serde::{Deserialize, Serialize};

/// Percentage at or above which a positive prediction is considered high risk.
pub const HIGH_RISK_PCT: f64 = 60.0;

/// Risk tier shown to clinicians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    /// Below the decision threshold
    Low,
    /// Predicted readmission, below the high-risk percentage
    Moderate,
    /// Predicted readmission at or above the high-risk percentage
    High,
}

impl RiskTier {
    /// Assign a tier from the binary prediction and the displayed percentage.
    ///
    /// The percentage only matters for positive predictions; a negative
    /// prediction is always `Low`.
    #[must_use]
    pub fn from_prediction(predicted_class: u8, probability_pct: f64) -> Self {
        match predicted_class {
            1 if probability_pct >= HIGH_RISK_PCT => Self::High,
            1 => Self::Moderate,
            _ => Self::Low,
        }
    }

    /// Headline shown on the result card.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk of Readmission",
            Self::Moderate => "Moderate Risk of Readmission",
            Self::High => "High Risk of Readmission",
        }
    }

    /// Follow-up guidance for the care team.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Patient demonstrates low readmission probability indicators",
            Self::Moderate => "Patient may benefit from enhanced discharge planning",
            Self::High => "Patient requires close monitoring and early intervention",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Round a probability to a percentage with one decimal place.
///
/// Rounds `probability * 100` once, on its exact binary value.
#[must_use]
pub fn probability_pct(probability: f64) -> f64 {
    let pct = probability * 100.0;
    format!("{pct:.1}").parse().unwrap_or(pct)
}

/// Result of thresholding one model probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Raw, unrounded probability of readmission (0.0 to 1.0)
    pub probability: f64,

    /// Binary prediction (0 = not readmitted, 1 = readmitted)
    pub predicted_class: u8,

    pub risk_tier: RiskTier,
}

impl PredictionResult {
    /// Threshold a probability and assign its tier.
    ///
    /// The threshold is inclusive: a probability equal to it is positive.
    #[must_use]
    pub fn new(probability: f64, threshold: f64) -> Self {
        let predicted_class = u8::from(probability >= threshold);
        Self {
            probability,
            predicted_class,
            risk_tier: RiskTier::from_prediction(predicted_class, probability_pct(probability)),
        }
    }

    /// Probability as a percentage rounded to one decimal, for display.
    #[must_use]
    pub fn probability_pct(&self) -> f64 {
        probability_pct(self.probability)
    }
}

/// Prediction record handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Unique identifier for audit trails
    pub id: String,

    pub result: PredictionResult,

    /// `result.probability` as a rounded percentage
    pub probability_pct: f64,

    /// Decision threshold the result was computed with
    pub threshold: f64,

    /// Fixed confidence figure displayed next to the result
    pub display_confidence_pct: u8,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionReport {
    #[must_use]
    pub fn new(result: PredictionResult, threshold: f64, display_confidence_pct: u8) -> Self {
        Self {
            id: uuid_v4(),
            probability_pct: result.probability_pct(),
            result,
            threshold,
            display_confidence_pct,
            created_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn risk_tier(&self) -> RiskTier {
        self.result.risk_tier
    }
}

/// Generate a random UUID v4 string.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.31;

    #[test]
    fn test_threshold_is_inclusive() {
        let result = PredictionResult::new(0.31, THRESHOLD);
        assert_eq!(result.predicted_class, 1);
        assert!((result.probability_pct() - 31.0).abs() < 1e-9);
        assert_eq!(result.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn test_high_tier() {
        let result = PredictionResult::new(0.75, THRESHOLD);
        assert_eq!(result.predicted_class, 1);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_low_tier_ignores_percentage() {
        let result = PredictionResult::new(0.05, THRESHOLD);
        assert_eq!(result.predicted_class, 0);
        assert_eq!(result.risk_tier, RiskTier::Low);

        // With a threshold above 60% a negative prediction stays Low.
        let result = PredictionResult::new(0.65, 0.7);
        assert_eq!(result.predicted_class, 0);
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_tier_boundary_at_sixty_percent() {
        assert_eq!(RiskTier::from_prediction(1, 60.0), RiskTier::High);
        assert_eq!(RiskTier::from_prediction(1, 59.9), RiskTier::Moderate);
        assert_eq!(RiskTier::from_prediction(0, 60.0), RiskTier::Low);

        assert_eq!(PredictionResult::new(0.60, THRESHOLD).risk_tier, RiskTier::High);
        assert_eq!(PredictionResult::new(0.599, THRESHOLD).risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn test_probability_pct_rounding() {
        assert!((probability_pct(0.28941742543455484) - 28.9).abs() < 1e-9);
        assert!((probability_pct(0.5972030456118014) - 59.7).abs() < 1e-9);
        assert!((probability_pct(1.0) - 100.0).abs() < 1e-9);
        assert!(probability_pct(0.0).abs() < 1e-9);
    }

    #[test]
    fn test_probability_pct_rounds_once() {
        // 0.1435 * 100 is just below 14.35 in binary.
        assert!((probability_pct(0.1435) - 14.3).abs() < 1e-9);
        assert!((probability_pct(0.2195) - 21.9).abs() < 1e-9);
        assert!((probability_pct(0.5996) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_probability_preserved() {
        let result = PredictionResult::new(0.123456789, THRESHOLD);
        assert!((result.probability - 0.123456789).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_creation() {
        let report = PredictionReport::new(PredictionResult::new(0.75, THRESHOLD), THRESHOLD, 85);

        assert_eq!(report.risk_tier(), RiskTier::High);
        assert!((report.probability_pct - 75.0).abs() < 1e-9);
        assert!((report.threshold - THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(report.display_confidence_pct, 85);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}
