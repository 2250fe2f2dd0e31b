//! Model signing utility for readmission model artifacts.
//!
//! Writes `manifest.json` (SHA-256 of `model.json`, `scaler.json` and
//! `columns.json`) and `model.sig` (Ed25519 signature over the manifest
//! bytes) into a model directory.
//!
//! # Usage
//!
//! ```bash
//! READMIT_MODEL_SIGNING_KEY_B64_FILE=seed.b64 cargo run --bin sign_model -- <model_dir>
//! ```
//!
//! The seed file holds 32 random bytes, base64 encoded. The printed verifying
//! key goes into `READMIT_MODEL_SIGNING_PUBKEY_B64` on the serving side.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use readmit::adapters::artifacts::{
    sha256_hex, ModelManifest, ARTIFACT_FILES, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};

const KEY_FILE_ENV: &str = "READMIT_MODEL_SIGNING_KEY_B64_FILE";
const KEY_B64_ENV: &str = "READMIT_MODEL_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn non_empty_secret(raw: &str) -> Result<Zeroizing<String>, String> {
    let secret = raw.trim_end_matches(['\n', '\r']).to_string();
    if secret.is_empty() {
        return Err("Empty signing key".to_string());
    }
    Ok(Zeroizing::new(secret))
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>, String> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim())
                .map_err(|e| format!("Failed reading signing key file: {e}"))?,
        );
        return non_empty_secret(&content);
    }

    // Dev-only fallback for convenience.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_B64_ENV) {
            return non_empty_secret(&v);
        }
    }

    Err(format!(
        "Missing signing key. Provide {KEY_FILE_ENV} (or {KEY_B64_ENV} in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed, String> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );

    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn parse_args() -> Result<PathBuf, String> {
    let usage = || "Usage: sign_model <model_dir>".to_string();
    let mut args = env::args().skip(1);
    let dir = args.next().ok_or_else(usage)?;
    if dir == "-h" || dir == "--help" || args.next().is_some() {
        return Err(usage());
    }
    Ok(PathBuf::from(dir))
}

fn main() -> Result<(), String> {
    let model_dir = parse_args()?;
    if !model_dir.is_dir() {
        return Err(format!("{model_dir:?} is not a directory"));
    }

    let mut files = BTreeMap::new();
    for name in ARTIFACT_FILES {
        let path = model_dir.join(name);
        let bytes = fs::read(&path).map_err(|e| format!("Failed to read {path:?}: {e}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = ModelManifest {
        version: MANIFEST_VERSION,
        created_at: unix_now(),
        files,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signing_key.sign(&manifest_bytes).to_bytes())
        .map_err(|e| format!("Failed to write {sig_path:?}: {e}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "READMIT_MODEL_SIGNING_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().to_bytes())
    );

    Ok(())
}
