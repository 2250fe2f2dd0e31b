//! Feature alignment: patient input to the model's training-time layout.

use crate::domain::{AlignedFeatureVector, FeatureSchema, PatientInput};
use crate::ports::{FeatureScaler, ModelError};
use crate::ReadmitError;

/// Encode `input` into exactly the columns of `schema` and scale the numeric subset.
///
/// Categorical fields are one-hot encoded; categories the input did not select
/// are zero, including categories the schema knows but the caller never sends.
/// Columns the schema does not know are dropped. Only the columns named by
/// `scaler.feature_names()` are transformed; the rest pass through unchanged.
///
/// # Errors
/// - `SchemaMismatch` if the schema lacks a scaler column
///
/// An empty schema cannot reach this point; [`FeatureSchema::new`] rejects it.
/// - `ModelInvocation` if the scaler fails or produces a non-finite value
pub fn align<S>(
    input: &PatientInput,
    schema: &FeatureSchema,
    scaler: &S,
) -> Result<AlignedFeatureVector, ReadmitError>
where
    S: FeatureScaler + ?Sized,
{
    let mut vector = schema.project(input.raw_features());

    let positions = schema.positions_of("scaler", scaler.feature_names())?;
    let scaled = scaler.transform(&vector.gather(&positions))?;
    if scaled.len() != positions.len() {
        return Err(ModelError::InputLength {
            expected: positions.len(),
            found: scaled.len(),
        }
        .into());
    }
    if let Some(i) = scaled.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite(scaler.feature_names()[i].clone()).into());
    }

    vector.scatter(&positions, &scaled);
    Ok(vector)
}
