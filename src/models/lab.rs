use serde::{Deserialize, Serialize};

use super::enums::ResultStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: ResultStatus,
    pub recorded_at: String,
}
