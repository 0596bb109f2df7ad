use serde::{Deserialize, Serialize};

/// Archived patient-facing rendering of a processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub patient_name: String,
    pub summary: String,
    pub filename: String,
    pub created_at: String,
}
