//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the readmission prediction pipeline.

mod aligner;
mod classifier;
mod context;
mod inference;

pub use aligner::align;
pub use classifier::classify;
pub use context::ModelArtifacts;
pub use inference::PredictionService;
