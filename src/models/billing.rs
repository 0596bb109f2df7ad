use serde::{Deserialize, Serialize};

use super::enums::{BillingStatus, PaymentMethod};

/// Append-only ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: i64,
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    pub amount: f64,
    pub status: BillingStatus,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub patient_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub description: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub patient_id: i64,
    pub amount: f64,
    pub description: String,
    pub date: String,
}
