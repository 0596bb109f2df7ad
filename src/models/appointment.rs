use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub cancelled_at: Option<String>,
}
