//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the prediction pipeline and the trained artifacts it scores with.

mod model;

pub use model::{FeatureScaler, ModelError, ReadmissionModel};
