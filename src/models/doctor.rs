use serde::{Deserialize, Serialize};

/// Fixed daily template a doctor's bookable slots are cut from.
/// Times are `HH:MM`; working days are three-letter weekday names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub working_days: Vec<String>,
    pub day_start: String,
    pub day_end: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub slot_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub consultation_fee: f64,
    pub working_hours: WorkingHours,
}
