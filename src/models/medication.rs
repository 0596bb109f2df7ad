use serde::{Deserialize, Serialize};

/// A single mention of a medication, either entered directly or
/// extracted alongside an archived summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub summary_id: Option<i64>,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub noted_at: String,
}
