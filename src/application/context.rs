//! Immutable scoring context shared by every prediction request.

use crate::domain::FeatureSchema;
use crate::ports::{FeatureScaler, ReadmissionModel};
use crate::ReadmitError;

/// Model, scaler and feature schema loaded once at startup.
///
/// Never mutated after construction; wrap in `Arc` to share across callers.
#[derive(Debug)]
pub struct ModelArtifacts<M, S> {
    model: M,
    scaler: S,
    schema: FeatureSchema,
}

impl<M, S> ModelArtifacts<M, S>
where
    M: ReadmissionModel,
    S: FeatureScaler,
{
    /// Bundle loaded artifacts after checking that every scaler column is
    /// part of the schema.
    ///
    /// # Errors
    /// Returns `ReadmitError::SchemaMismatch` naming the first scaler column
    /// the schema does not contain.
    pub fn new(model: M, scaler: S, schema: FeatureSchema) -> Result<Self, ReadmitError> {
        schema.positions_of("scaler", scaler.feature_names())?;
        Ok(Self {
            model,
            scaler,
            schema,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn scaler(&self) -> &S {
        &self.scaler
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}
