//! Signed manifest binding the model artifacts.
//!
//! `manifest.json` lists the SHA-256 of every artifact file and `model.sig`
//! holds a raw 64-byte Ed25519 signature over the exact manifest bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ARTIFACT_FILES, MANIFEST_FILE, SIGNATURE_FILE};
use crate::ReadmitError;

pub const MANIFEST_VERSION: u32 = 1;

pub const PUBKEY_B64_ENV: &str = "READMIT_MODEL_SIGNING_PUBKEY_B64";
pub const PUBKEY_FILE_ENV: &str = "READMIT_MODEL_SIGNING_PUBKEY_B64_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was signed
    pub created_at: i64,
    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn integrity_error(reason: impl Into<String>) -> ReadmitError {
    ReadmitError::ArtifactLoad {
        artifact: MANIFEST_FILE.to_string(),
        reason: reason.into(),
    }
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ReadmitError::Config` if the key is not 32 valid bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ReadmitError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ReadmitError::Config("Invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ReadmitError::Config("Invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ReadmitError::Config("Invalid verifying key".into()))
}

/// Resolve the verifying key from `READMIT_MODEL_SIGNING_PUBKEY_B64_FILE`
/// or `READMIT_MODEL_SIGNING_PUBKEY_B64`, in that order.
///
/// # Errors
/// Returns `ReadmitError::Config` if a configured key cannot be read or decoded.
pub fn verifying_key_from_env() -> Result<Option<VerifyingKey>, ReadmitError> {
    if let Ok(path) = std::env::var(PUBKEY_FILE_ENV) {
        let b64 = fs::read_to_string(path.trim())
            .map_err(|e| ReadmitError::Config(format!("Failed reading pubkey file: {e}")))?;
        return verifying_key_from_b64(&b64).map(Some);
    }
    match std::env::var(PUBKEY_B64_ENV) {
        Ok(b64) => verifying_key_from_b64(&b64).map(Some),
        Err(_) => Ok(None),
    }
}

/// A manifest whose signature checked out, with the file contents it hashed.
#[derive(Debug, Clone)]
pub struct VerifiedManifest {
    pub manifest: ModelManifest,
    /// File name -> bytes whose SHA-256 matched the manifest
    pub contents: BTreeMap<String, Vec<u8>>,
}

/// Verify the signed manifest in `dir` and the hashes of every artifact it binds.
///
/// Each file is read once; callers must parse the returned contents rather
/// than reading the files again.
///
/// # Errors
/// Returns `ReadmitError::ArtifactLoad` if the signature, manifest contents,
/// or any file hash fails verification.
pub fn verify_manifest(dir: &Path, key: &VerifyingKey) -> Result<VerifiedManifest, ReadmitError> {
    let sig_bytes = fs::read(dir.join(SIGNATURE_FILE))
        .map_err(|e| integrity_error(format!("Failed to read signature: {e}")))?;
    let sig_bytes: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| integrity_error("Invalid signature length (expected 64 bytes)"))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let manifest_bytes = fs::read(dir.join(MANIFEST_FILE))
        .map_err(|e| integrity_error(format!("Failed to read manifest: {e}")))?;

    key.verify(&manifest_bytes, &signature)
        .map_err(|_| integrity_error("Invalid model signature"))?;

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| integrity_error(format!("Invalid manifest format: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(integrity_error(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    if let Some(unbound) = ARTIFACT_FILES
        .iter()
        .find(|name| !manifest.files.contains_key(**name))
    {
        return Err(integrity_error(format!("Manifest does not bind {unbound}")));
    }

    let mut contents = BTreeMap::new();
    for (rel, expected_hex) in &manifest.files {
        let bytes = fs::read(dir.join(rel)).map_err(|e| {
            integrity_error(format!("Manifest references missing/unreadable file {rel}: {e}"))
        })?;
        if !sha256_hex(&bytes).eq_ignore_ascii_case(expected_hex) {
            return Err(integrity_error(format!("File hash mismatch for {rel}")));
        }
        contents.insert(rel.clone(), bytes);
    }

    tracing::info!("Model manifest signature and hashes verified");
    Ok(VerifiedManifest { manifest, contents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn write_signed(dir: &Path, key: &SigningKey, files: &[(&str, &[u8])]) {
        let mut map = BTreeMap::new();
        for (name, contents) in files {
            fs::write(dir.join(name), contents).expect("write artifact");
            map.insert((*name).to_string(), sha256_hex(contents));
        }
        let manifest = ModelManifest {
            version: MANIFEST_VERSION,
            created_at: 1_700_000_000,
            files: map,
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        fs::write(dir.join(SIGNATURE_FILE), key.sign(&bytes).to_bytes()).expect("write sig");
    }

    const ALL: [(&str, &[u8]); 3] = [
        ("model.json", b"{}"),
        ("scaler.json", b"{}"),
        ("columns.json", b"[]"),
    ];

    #[test]
    fn test_verifies_signed_manifest() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed(temp.path(), &key, &ALL);

        let verified = verify_manifest(temp.path(), &key.verifying_key()).expect("valid");
        assert_eq!(verified.manifest.files.len(), 3);
    }

    #[test]
    fn test_returns_the_bytes_it_hashed() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed(temp.path(), &key, &ALL);

        let verified = verify_manifest(temp.path(), &key.verifying_key()).expect("valid");
        // Later changes on disk do not reach the verified contents.
        fs::write(temp.path().join("columns.json"), b"[\"swapped\"]").expect("overwrite");

        for (name, contents) in ALL {
            assert_eq!(verified.contents[name].as_slice(), contents);
            assert_eq!(sha256_hex(&verified.contents[name]), verified.manifest.files[name]);
        }
    }

    #[test]
    fn test_rejects_wrong_key() {
        let temp = tempdir().expect("tempdir");
        write_signed(temp.path(), &signing_key(), &ALL);

        let err = verify_manifest(temp.path(), &signing_key().verifying_key())
            .expect_err("must fail");
        assert!(err.to_string().contains("Invalid model signature"));
    }

    #[test]
    fn test_rejects_tampered_artifact() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed(temp.path(), &key, &ALL);
        fs::write(temp.path().join("scaler.json"), b"{\"tampered\":true}").expect("overwrite");

        let err = verify_manifest(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch for scaler.json"));
    }

    #[test]
    fn test_rejects_manifest_missing_an_artifact() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed(temp.path(), &key, &ALL[..2]);

        let err = verify_manifest(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(err.to_string().contains("does not bind columns.json"));
    }

    #[test]
    fn test_rejects_truncated_signature() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed(temp.path(), &key, &ALL);
        fs::write(temp.path().join(SIGNATURE_FILE), [0u8; 10]).expect("truncate sig");

        let err = verify_manifest(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(err.to_string().contains("signature length"));
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let parsed = verifying_key_from_b64(&format!("{b64}\n")).expect("valid key");
        assert_eq!(parsed, key.verifying_key());

        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
