//! JSON artifact adapter: the trained classifier, scaler and column list.
//!
//! The training pipeline exports three files into one model directory:
//!
//! - `model.json`: logistic regression coefficients in schema order
//! - `scaler.json`: standard scaler mean/scale for the numeric columns
//! - `columns.json`: ordered training-time feature names
//!
//! Loading is all-or-nothing. Any missing, unreadable or inconsistent file is
//! a startup error and no predictions are served.
//!
//! # Integrity
//!
//! When `manifest.json` and `model.sig` are present, the Ed25519 signature and
//! the SHA-256 of every artifact are verified before anything is parsed.
//! Unsigned directories are refused unless explicitly allowed.

mod manifest;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use manifest::{
    sha256_hex, verify_manifest, verifying_key_from_b64, verifying_key_from_env, ModelManifest,
    VerifiedManifest, MANIFEST_VERSION, PUBKEY_B64_ENV, PUBKEY_FILE_ENV,
};

use crate::application::ModelArtifacts;
use crate::config::{AppConfig, ALLOW_UNSIGNED_MODELS_ENV};
use crate::domain::{AlignedFeatureVector, FeatureSchema};
use crate::ports::{FeatureScaler, ModelError, ReadmissionModel};
use crate::ReadmitError;

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const COLUMNS_FILE: &str = "columns.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Files a model directory must contain, in load order.
pub const ARTIFACT_FILES: [&str; 3] = [MODEL_FILE, SCALER_FILE, COLUMNS_FILE];

const LOGISTIC_REGRESSION: &str = "logistic_regression";

/// Binary logistic regression exported from the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionModel {
    pub model_type: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl ReadmissionModel for LogisticRegressionModel {
    fn predict_proba(&self, features: &AlignedFeatureVector) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::InputLength {
                expected: self.coefficients.len(),
                found: features.len(),
            });
        }

        let mut z = self.intercept;
        for ((column, value), coef) in features.iter().zip(&self.coefficients) {
            if !value.is_finite() {
                return Err(ModelError::NonFinite(column.to_string()));
            }
            z += coef * value;
        }

        if !z.is_finite() {
            return Err(ModelError::Invocation(format!(
                "decision function is not finite ({z})"
            )));
        }
        Ok(sigmoid(z))
    }
}

/// Standard scaler (`(x - mean) / scale`) fitted on the numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler for StandardScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        if values.len() != self.mean.len() {
            return Err(ModelError::InputLength {
                expected: self.mean.len(),
                found: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant columns were fitted with zero variance.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Artifacts as loaded from a model directory.
pub type JsonArtifacts = ModelArtifacts<LogisticRegressionModel, StandardScaler>;

/// Loads and validates a model directory.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    allow_unsigned: bool,
    verifying_key: Option<VerifyingKey>,
}

fn load_error(artifact: &str, reason: impl Into<String>) -> ReadmitError {
    ReadmitError::ArtifactLoad {
        artifact: artifact.to_string(),
        reason: reason.into(),
    }
}

/// Artifact file name -> contents, read once per load.
type ArtifactBytes = BTreeMap<String, Vec<u8>>;

fn parse_json<T: DeserializeOwned>(files: &ArtifactBytes, file: &str) -> Result<T, ReadmitError> {
    let bytes = files
        .get(file)
        .ok_or_else(|| load_error(file, "not covered by the loaded artifact set"))?;
    serde_json::from_slice(bytes).map_err(|e| load_error(file, e.to_string()))
}

impl ArtifactLoader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            allow_unsigned: false,
            verifying_key: None,
        }
    }

    /// Loader for the configured model directory, with the verifying key
    /// taken from the environment.
    ///
    /// # Errors
    /// Returns `ReadmitError::Config` if a configured verifying key is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, ReadmitError> {
        let mut loader = Self::new(&config.model_dir).allow_unsigned(config.allow_unsigned_models);
        loader.verifying_key = verifying_key_from_env()?;
        Ok(loader)
    }

    #[must_use]
    pub fn allow_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the model, scaler and feature schema.
    ///
    /// # Errors
    /// - `MissingArtifacts` naming every absent file
    /// - `ArtifactLoad` for unreadable, malformed or unverifiable files
    /// - `SchemaMismatch` if the model or scaler disagree with the column list
    pub fn load(&self) -> Result<JsonArtifacts, ReadmitError> {
        let missing: Vec<String> = ARTIFACT_FILES
            .iter()
            .map(|name| self.dir.join(name))
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if !missing.is_empty() {
            tracing::error!("Model artifacts missing: {}", missing.join(", "));
            return Err(ReadmitError::MissingArtifacts(missing));
        }

        let files = self.read_artifacts()?;

        let columns: Vec<String> = parse_json(&files, COLUMNS_FILE)?;
        let schema = FeatureSchema::new(columns)?;

        let model: LogisticRegressionModel = parse_json(&files, MODEL_FILE)?;
        if model.model_type != LOGISTIC_REGRESSION {
            return Err(load_error(
                MODEL_FILE,
                format!("unsupported model_type '{}'", model.model_type),
            ));
        }
        if model.coefficients.len() != model.feature_names.len() {
            return Err(load_error(
                MODEL_FILE,
                "coefficients length does not match feature_names length",
            ));
        }
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(load_error(MODEL_FILE, "parameters must be finite"));
        }
        schema.ensure_matches(MODEL_FILE, &model.feature_names)?;

        let scaler: StandardScaler = parse_json(&files, SCALER_FILE)?;
        let n = scaler.feature_names.len();
        if scaler.mean.len() != n || scaler.scale.len() != n {
            return Err(load_error(
                SCALER_FILE,
                "mean/scale lengths do not match feature_names length",
            ));
        }
        if scaler.mean.iter().chain(&scaler.scale).any(|v| !v.is_finite()) {
            return Err(load_error(SCALER_FILE, "parameters must be finite"));
        }

        let artifacts = ModelArtifacts::new(model, scaler, schema)?;

        tracing::info!(
            "Loaded model artifacts from {:?} (n_features={}, n_scaled={})",
            self.dir,
            artifacts.schema().len(),
            n
        );
        Ok(artifacts)
    }

    /// Read the artifact files, verifying them first when the directory is signed.
    ///
    /// Signed contents come straight from the verification pass, so what is
    /// parsed is exactly what was hashed.
    fn read_artifacts(&self) -> Result<ArtifactBytes, ReadmitError> {
        let has_manifest = self.dir.join(MANIFEST_FILE).exists();
        let has_signature = self.dir.join(SIGNATURE_FILE).exists();

        match (has_manifest, has_signature) {
            (true, true) => {
                let key = self.verifying_key.as_ref().ok_or_else(|| {
                    load_error(
                        SIGNATURE_FILE,
                        format!(
                            "signed artifacts found but no verifying key configured \
                             (set {PUBKEY_B64_ENV} or {PUBKEY_FILE_ENV})"
                        ),
                    )
                })?;
                Ok(verify_manifest(&self.dir, key)?.contents)
            }
            (false, false) if self.allow_unsigned => {
                tracing::warn!(
                    "Loading UNSIGNED model artifacts from {:?} ({ALLOW_UNSIGNED_MODELS_ENV}=true)",
                    self.dir
                );
                ARTIFACT_FILES
                    .iter()
                    .map(|name| {
                        fs::read(self.dir.join(name))
                            .map(|bytes| ((*name).to_string(), bytes))
                            .map_err(|e| load_error(name, e.to_string()))
                    })
                    .collect()
            }
            (false, false) => Err(load_error(
                SIGNATURE_FILE,
                format!(
                    "signed manifest required; set {ALLOW_UNSIGNED_MODELS_ENV}=true to load unsigned artifacts"
                ),
            )),
            (true, false) => Err(load_error(SIGNATURE_FILE, "manifest present without signature")),
            (false, true) => Err(load_error(MANIFEST_FILE, "signature present without manifest")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientInput;
    use ed25519_dalek::{Signer, SigningKey};
    use tempfile::tempdir;

    fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
    }

    fn copy_fixtures(dir: &Path) {
        for name in ARTIFACT_FILES {
            fs::copy(fixture_dir().join(name), dir.join(name)).expect("copy fixture");
        }
    }

    #[test]
    fn test_loads_fixture_artifacts() {
        let artifacts = ArtifactLoader::new(fixture_dir())
            .allow_unsigned(true)
            .load()
            .expect("Fixture artifacts should load");

        assert_eq!(artifacts.schema().len(), 11);
        assert_eq!(artifacts.schema().columns()[0], "age");
        assert_eq!(artifacts.scaler().feature_names().len(), 5);
    }

    #[test]
    fn test_missing_artifacts_are_all_named() {
        let temp = tempdir().expect("tempdir");
        fs::copy(fixture_dir().join(SCALER_FILE), temp.path().join(SCALER_FILE))
            .expect("copy scaler");

        let err = ArtifactLoader::new(temp.path())
            .allow_unsigned(true)
            .load()
            .expect_err("must fail");
        match err {
            ReadmitError::MissingArtifacts(paths) => {
                assert_eq!(paths.len(), 2);
                assert!(paths[0].ends_with(MODEL_FILE));
                assert!(paths[1].ends_with(COLUMNS_FILE));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsigned_refused_by_default() {
        let err = ArtifactLoader::new(fixture_dir()).load().expect_err("must fail");
        assert!(matches!(err, ReadmitError::ArtifactLoad { .. }));
        assert!(err.to_string().contains(ALLOW_UNSIGNED_MODELS_ENV));
    }

    #[test]
    fn test_malformed_json_names_artifact() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        fs::write(temp.path().join(MODEL_FILE), b"{ not json").expect("write");

        let err = ArtifactLoader::new(temp.path())
            .allow_unsigned(true)
            .load()
            .expect_err("must fail");
        match err {
            ReadmitError::ArtifactLoad { artifact, .. } => assert_eq!(artifact, MODEL_FILE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_columns_is_schema_mismatch() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        fs::write(temp.path().join(COLUMNS_FILE), b"[]").expect("write");

        let err = ArtifactLoader::new(temp.path())
            .allow_unsigned(true)
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ReadmitError::SchemaMismatch(_)));
    }

    #[test]
    fn test_model_column_order_must_match_schema() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());

        let mut model: LogisticRegressionModel =
            serde_json::from_slice(&fs::read(fixture_dir().join(MODEL_FILE)).expect("read"))
                .expect("fixture model");
        model.feature_names.swap(0, 1);
        fs::write(
            temp.path().join(MODEL_FILE),
            serde_json::to_vec(&model).expect("serialize"),
        )
        .expect("write");

        let err = ArtifactLoader::new(temp.path())
            .allow_unsigned(true)
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ReadmitError::SchemaMismatch(_)));
    }

    #[test]
    fn test_scaler_column_outside_schema_is_schema_mismatch() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());

        let scaler = StandardScaler {
            feature_names: vec!["age".into(), "bmi".into()],
            mean: vec![60.0, 27.0],
            scale: vec![15.0, 4.0],
        };
        fs::write(
            temp.path().join(SCALER_FILE),
            serde_json::to_vec(&scaler).expect("serialize"),
        )
        .expect("write");

        let err = ArtifactLoader::new(temp.path())
            .allow_unsigned(true)
            .load()
            .expect_err("must fail");
        assert!(err.to_string().contains("'bmi'"));
    }

    fn sign_dir(dir: &Path, signing_key: &SigningKey) {
        let files: BTreeMap<String, String> = ARTIFACT_FILES
            .iter()
            .map(|name| {
                let bytes = fs::read(dir.join(name)).expect("read");
                ((*name).to_string(), sha256_hex(&bytes))
            })
            .collect();
        let manifest = ModelManifest {
            version: MANIFEST_VERSION,
            created_at: 1_700_000_000,
            files,
        };
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("write manifest");
        fs::write(
            dir.join(SIGNATURE_FILE),
            signing_key.sign(&manifest_bytes).to_bytes(),
        )
        .expect("write sig");
    }

    #[test]
    fn test_loads_signed_artifacts() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        sign_dir(temp.path(), &signing_key);

        let loader = ArtifactLoader::new(temp.path());
        let err = loader.clone().load().expect_err("no key configured");
        assert!(err.to_string().contains("no verifying key"));

        let artifacts = loader
            .with_verifying_key(signing_key.verifying_key())
            .load()
            .expect("signed artifacts should load");
        assert_eq!(artifacts.schema().len(), 11);
    }

    #[test]
    fn test_signed_artifact_changed_after_signing_is_refused() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        sign_dir(temp.path(), &signing_key);
        fs::write(temp.path().join(COLUMNS_FILE), b"[\"age\"]").expect("overwrite");

        let err = ArtifactLoader::new(temp.path())
            .with_verifying_key(signing_key.verifying_key())
            .load()
            .expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch for columns.json"));
    }

    #[test]
    fn test_logistic_regression_scores_in_unit_interval() {
        let artifacts = ArtifactLoader::new(fixture_dir())
            .allow_unsigned(true)
            .load()
            .expect("fixtures");
        let vector = artifacts.schema().project(PatientInput::default().raw_features());

        let p = artifacts.model().predict_proba(&vector).expect("score");
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_logistic_regression_rejects_wrong_length() {
        let model = LogisticRegressionModel {
            model_type: LOGISTIC_REGRESSION.into(),
            feature_names: vec!["a".into(), "b".into()],
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        };
        let schema = FeatureSchema::new(vec!["a".into()]).expect("schema");
        let err = model
            .predict_proba(&schema.project(Vec::new()))
            .expect_err("must fail");
        assert_eq!(err, ModelError::InputLength { expected: 2, found: 1 });
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_standard_scaler_transform() {
        let scaler = StandardScaler {
            feature_names: vec!["a".into(), "b".into()],
            mean: vec![10.0, 3.0],
            scale: vec![2.0, 0.0],
        };
        let out = scaler.transform(&[14.0, 5.0]).expect("transform");
        assert_eq!(out, vec![2.0, 2.0]);

        assert!(scaler.transform(&[1.0]).is_err());
    }
}
