use serde::{Deserialize, Serialize};

/// Journal-style check-in written by a patient. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub id: i64,
    pub patient_id: i64,
    pub text: String,
    pub mood: Option<String>,
    pub symptoms: Option<String>,
    pub recorded_at: String,
}
