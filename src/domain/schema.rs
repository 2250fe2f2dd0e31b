//! Training-time feature schema and schema-aligned feature vectors.

use std::collections::HashMap;
use std::sync::Arc;

/// Structural problems between a schema and the data or artifacts aligned to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("feature schema is empty")]
    Empty,

    #[error("feature schema lists column '{0}' more than once")]
    DuplicateColumn(String),

    #[error("{artifact} column '{column}' is not part of the feature schema")]
    MissingColumn { artifact: String, column: String },

    #[error("{artifact} expects {found} columns but the feature schema has {expected}")]
    LengthMismatch {
        artifact: String,
        expected: usize,
        found: usize,
    },

    #[error("{artifact} column {position} is '{found}' but the feature schema has '{expected}'")]
    OrderMismatch {
        artifact: String,
        position: usize,
        expected: String,
        found: String,
    },
}

/// Ordered list of columns the model was trained on.
///
/// Cheap to clone; all clones share the same column storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Arc<[String]>,
    index: Arc<HashMap<String, usize>>,
}

impl FeatureSchema {
    /// Build a schema from training column names.
    ///
    /// # Errors
    /// Returns `SchemaError::Empty` for an empty list and
    /// `SchemaError::DuplicateColumn` if a name repeats.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self {
            columns: columns.into(),
            index: Arc::new(index),
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `column` in training order.
    #[must_use]
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Check that an artifact's own column list names exactly this schema, in order.
    ///
    /// # Errors
    /// Returns `LengthMismatch` or `OrderMismatch` naming the first difference.
    pub fn ensure_matches(&self, artifact: &str, columns: &[String]) -> Result<(), SchemaError> {
        if columns.len() != self.len() {
            return Err(SchemaError::LengthMismatch {
                artifact: artifact.to_string(),
                expected: self.len(),
                found: columns.len(),
            });
        }

        match self
            .columns
            .iter()
            .zip(columns)
            .position(|(expected, found)| expected != found)
        {
            Some(position) => Err(SchemaError::OrderMismatch {
                artifact: artifact.to_string(),
                position,
                expected: self.columns[position].clone(),
                found: columns[position].clone(),
            }),
            None => Ok(()),
        }
    }

    /// Resolve a subset of column names to their positions in this schema.
    ///
    /// # Errors
    /// Returns `MissingColumn` for the first name the schema does not contain.
    pub fn positions_of(&self, artifact: &str, columns: &[String]) -> Result<Vec<usize>, SchemaError> {
        columns
            .iter()
            .map(|column| {
                self.index_of(column).ok_or_else(|| SchemaError::MissingColumn {
                    artifact: artifact.to_string(),
                    column: column.clone(),
                })
            })
            .collect()
    }

    /// Project sparse column/value pairs onto this schema.
    ///
    /// Total over any input: schema columns not present in `raw` are zero,
    /// and columns in `raw` that the schema does not know are dropped.
    /// The result always has exactly the schema's columns in schema order.
    #[must_use]
    pub fn project<I>(&self, raw: I) -> AlignedFeatureVector
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut values = vec![0.0; self.len()];

        for (column, value) in raw {
            match self.index_of(&column) {
                Some(i) => values[i] = value,
                None => tracing::debug!("Dropping column not in feature schema: {column}"),
            }
        }

        AlignedFeatureVector {
            schema: self.clone(),
            values,
        }
    }
}

/// One row of model input laid out exactly as the feature schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl AlignedFeatureVector {
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.index_of(column).map(|i| self.values[i])
    }

    /// Column/value pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Values at the given positions, in the order given.
    pub(crate) fn gather(&self, positions: &[usize]) -> Vec<f64> {
        positions.iter().map(|&i| self.values[i]).collect()
    }

    /// Overwrite the values at `positions` with `replacement`, pairwise.
    pub(crate) fn scatter(&mut self, positions: &[usize], replacement: &[f64]) {
        for (&i, &value) in positions.iter().zip(replacement) {
            self.values[i] = value;
        }
    }
}
