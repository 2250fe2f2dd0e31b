//! Runtime configuration.
//!
//! All settings come from `READMIT_*` environment variables with built-in
//! defaults matching the reference deployment. Command-line flags in the
//! binary override individual fields after loading.

use std::path::PathBuf;

use crate::ReadmitError;

/// Decision threshold tuned for recall on the validation set.
pub const DEFAULT_THRESHOLD: f64 = 0.31;

/// Fixed confidence figure displayed next to each prediction.
pub const DEFAULT_DISPLAY_CONFIDENCE_PCT: u8 = 85;

pub const MODEL_DIR_ENV: &str = "READMIT_MODEL_DIR";
pub const THRESHOLD_ENV: &str = "READMIT_THRESHOLD";
pub const DISPLAY_CONFIDENCE_ENV: &str = "READMIT_DISPLAY_CONFIDENCE";
pub const ALLOW_UNSIGNED_MODELS_ENV: &str = "READMIT_ALLOW_UNSIGNED_MODELS";
pub const LOG_MODE_ENV: &str = "READMIT_LOG_MODE";
pub const LOG_FILE_ENV: &str = "READMIT_LOG_FILE";

/// Per-request prediction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionConfig {
    /// Probability at or above which readmission is predicted.
    pub threshold: f64,
    pub display_confidence_pct: u8,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            display_confidence_pct: DEFAULT_DISPLAY_CONFIDENCE_PCT,
        }
    }
}

impl PredictionConfig {
    /// # Errors
    /// Returns `ReadmitError::Config` if the threshold is outside (0, 1] or
    /// the confidence is above 100.
    pub fn validate(&self) -> Result<(), ReadmitError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ReadmitError::Config(format!(
                "threshold {} must be in (0, 1]",
                self.threshold
            )));
        }
        if self.display_confidence_pct > 100 {
            return Err(ReadmitError::Config(format!(
                "display confidence {} must be at most 100",
                self.display_confidence_pct
            )));
        }
        Ok(())
    }
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stderr,
    File(PathBuf),
}

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `model.json`, `scaler.json` and `columns.json`
    pub model_dir: PathBuf,
    pub prediction: PredictionConfig,
    /// Load artifacts that carry no signed manifest
    pub allow_unsigned_models: bool,
    pub log_mode: LogMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("model"),
            prediction: PredictionConfig::default(),
            allow_unsigned_models: false,
            log_mode: LogMode::Stderr,
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ReadmitError::Config` for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ReadmitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ReadmitError::Config` for unparsable or out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReadmitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(MODEL_DIR_ENV) {
            config.model_dir = PathBuf::from(dir.trim());
        }

        if let Some(v) = lookup(THRESHOLD_ENV) {
            config.prediction.threshold = v.trim().parse::<f64>().map_err(|_| {
                ReadmitError::Config(format!("{THRESHOLD_ENV} must be a number, got '{v}'"))
            })?;
        }

        if let Some(v) = lookup(DISPLAY_CONFIDENCE_ENV) {
            config.prediction.display_confidence_pct = v.trim().parse::<u8>().map_err(|_| {
                ReadmitError::Config(format!(
                    "{DISPLAY_CONFIDENCE_ENV} must be an integer percentage, got '{v}'"
                ))
            })?;
        }

        config.allow_unsigned_models = lookup(ALLOW_UNSIGNED_MODELS_ENV)
            .map(|v| parse_bool(v.trim()))
            .unwrap_or(false);

        config.log_mode = match lookup(LOG_MODE_ENV).as_deref().map(str::trim) {
            Some("file") => LogMode::File(
                lookup(LOG_FILE_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("readmit.log")),
            ),
            Some("stderr") | None => LogMode::Stderr,
            Some(other) => {
                return Err(ReadmitError::Config(format!(
                    "{LOG_MODE_ENV} must be 'stderr' or 'file', got '{other}'"
                )))
            }
        };

        config.prediction.validate()?;
        Ok(config)
    }
}
