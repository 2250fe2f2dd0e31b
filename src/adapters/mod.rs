//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON model, scaler and column files with signature checks
//! - `sanitize`: PII and secret filtering for logs

pub mod artifacts;
pub mod sanitize;
