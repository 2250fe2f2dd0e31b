//! Patient input types for 30-day readmission risk prediction.
//!
//! Field names match the column names used by the training pipeline, so the
//! numeric fields map one-to-one onto feature columns and each categorical
//! field expands to `<field>_<Category>` indicator columns.

use serde::{Deserialize, Serialize};

/// Categorical patient attribute that is one-hot encoded at inference time.
pub trait Categorical: Copy {
    /// Column prefix used by the training pipeline.
    const FIELD: &'static str;

    /// Category label as it appears in the training data.
    fn as_str(&self) -> &'static str;

    /// Name of the indicator column set to 1 for this category.
    fn one_hot_column(&self) -> String {
        format!("{}_{}", Self::FIELD, self.as_str())
    }
}

/// How the patient was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionType {
    Emergency,
    Urgent,
    Elective,
}

impl AdmissionType {
    pub const ALL: [Self; 3] = [Self::Emergency, Self::Urgent, Self::Elective];
}

impl Categorical for AdmissionType {
    const FIELD: &'static str = "admission_type";

    fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Urgent => "Urgent",
            Self::Elective => "Elective",
        }
    }
}

impl std::fmt::Display for AdmissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the patient went after discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DischargeDisposition {
    Home,
    Transfer,
    Rehabilitation,
}

impl DischargeDisposition {
    pub const ALL: [Self; 3] = [Self::Home, Self::Transfer, Self::Rehabilitation];
}

impl Categorical for DischargeDisposition {
    const FIELD: &'static str = "discharge_disposition";

    fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Transfer => "Transfer",
            Self::Rehabilitation => "Rehabilitation",
        }
    }
}

impl std::fmt::Display for DischargeDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient attributes submitted for a single prediction.
///
/// Created per request and never mutated. The prediction pipeline trusts its
/// caller to have checked ranges with [`PatientInput::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientInput {
    /// Age in years (18-100)
    pub age: u32,

    /// Length of stay in days (1-30)
    pub time_in_hospital: u32,

    /// Lab procedures performed during the stay (1-150)
    pub num_lab_procedures: u32,

    /// Distinct medications administered (1-50)
    pub num_medications: u32,

    /// Inpatient admissions in the preceding year (0-20)
    pub num_prior_admissions: u32,

    pub admission_type: AdmissionType,

    pub discharge_disposition: DischargeDisposition,
}

/// Numeric feature columns, in the order they are emitted by
/// [`PatientInput::raw_features`].
pub const NUMERIC_FEATURES: [&str; 5] = [
    "age",
    "time_in_hospital",
    "num_lab_procedures",
    "num_medications",
    "num_prior_admissions",
];

impl Default for PatientInput {
    /// Form defaults shown to clinicians before any field is edited.
    fn default() -> Self {
        Self {
            age: 50,
            time_in_hospital: 5,
            num_lab_procedures: 40,
            num_medications: 10,
            num_prior_admissions: 1,
            admission_type: AdmissionType::Emergency,
            discharge_disposition: DischargeDisposition::Home,
        }
    }
}

impl PatientInput {
    /// Sparse column/value pairs for this input.
    ///
    /// Numeric fields are emitted under their own names; each categorical
    /// field emits only the indicator column of the selected category.
    /// Columns the schema knows but this input does not produce are filled
    /// later by schema projection.
    #[must_use]
    pub fn raw_features(&self) -> Vec<(String, f64)> {
        let numeric = [
            self.age,
            self.time_in_hospital,
            self.num_lab_procedures,
            self.num_medications,
            self.num_prior_admissions,
        ];

        let mut raw: Vec<(String, f64)> = NUMERIC_FEATURES
            .iter()
            .zip(numeric)
            .map(|(name, value)| ((*name).to_string(), f64::from(value)))
            .collect();

        raw.push((self.admission_type.one_hot_column(), 1.0));
        raw.push((self.discharge_disposition.one_hot_column(), 1.0));
        raw
    }

    /// Validate that all fields are within the ranges offered by the input form.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let checks: [(&str, u32, u32, u32); 5] = [
            ("Age", self.age, 18, 100),
            ("Time in hospital", self.time_in_hospital, 1, 30),
            ("Lab procedures", self.num_lab_procedures, 1, 150),
            ("Medications", self.num_medications, 1, 50),
            ("Prior admissions", self.num_prior_admissions, 0, 20),
        ];

        let errors: Vec<String> = checks
            .iter()
            .filter(|(_, value, min, max)| !(*min..=*max).contains(value))
            .map(|(label, value, min, max)| format!("{label} {value} out of range [{min}, {max}]"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
