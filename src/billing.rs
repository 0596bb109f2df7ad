//! Billing — append-only ledger, payments, statements, and the derived summary.
//!
//! Nothing here is ever updated in place. The summary is recomputed from the
//! full record set on every call.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{self, now_timestamp};
use crate::directory;
use crate::error::{non_blank, required, StoreError};
use crate::models::enums::{BillingStatus, PaymentMethod};
use crate::models::*;

// ═══════════════════════════════════════════
// Input types
// ═══════════════════════════════════════════

/// New ledger line. `amount` accepts a JSON number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingRecordInput {
    pub patient_id: Option<i64>,
    pub appointment_id: Option<i64>,
    pub amount: Option<Value>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    pub amount: Option<Value>,
    pub method: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementInput {
    pub amount: Option<Value>,
    pub description: Option<String>,
}

// ═══════════════════════════════════════════
// Summary
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: String, // YYYY-MM
    pub billed: f64,
    pub paid: f64,
    pub outstanding: f64,
}

/// Aggregate view over the whole ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingSummary {
    pub total_billed: f64,
    pub total_paid: f64,
    pub total_outstanding: f64,
    pub record_count: usize,
    /// Always carries every status, zero when unused.
    pub counts_by_status: BTreeMap<String, usize>,
    /// Sum of the payments table, independent of record status.
    pub payments_received: f64,
    pub average_bill: f64,
    /// Distinct appointments referenced by at least one record.
    pub billed_appointments: usize,
    /// Appointments that are not cancelled.
    pub active_appointments: i64,
    /// Ascending by month.
    pub monthly: Vec<MonthlyTotal>,
}

// ═══════════════════════════════════════════
// Amounts
// ═══════════════════════════════════════════

/// Accept a JSON number or numeric string; reject negative and non-finite.
pub fn parse_amount(raw: Option<&Value>) -> Result<f64, StoreError> {
    let amount = match raw {
        None | Some(Value::Null) => return Err(StoreError::validation("amount is required")),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(StoreError::validation("amount is required"))
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| StoreError::validation("amount must be numeric"))?;

    if !amount.is_finite() {
        return Err(StoreError::validation("amount must be a finite number"));
    }
    if amount < 0.0 {
        return Err(StoreError::validation("amount must not be negative"));
    }
    Ok(amount)
}

// ═══════════════════════════════════════════
// Ledger
// ═══════════════════════════════════════════

pub fn create_billing_record(
    conn: &Connection,
    input: &BillingRecordInput,
) -> Result<BillingRecord, StoreError> {
    let patient_id = input
        .patient_id
        .ok_or_else(|| StoreError::validation("patient_id is required"))?;
    let amount = parse_amount(input.amount.as_ref())?;
    let status = match non_blank(input.status.as_deref()) {
        None => BillingStatus::Outstanding,
        Some(raw) => BillingStatus::from_str(&raw.to_lowercase())
            .map_err(|_| StoreError::validation(format!("Unknown billing status '{raw}'")))?,
    };

    directory::ensure_patient(conn, patient_id)?;
    if let Some(appointment_id) = input.appointment_id {
        let appointment = db::get_appointment(conn, appointment_id)?
            .ok_or(StoreError::not_found("Appointment", appointment_id))?;
        if appointment.patient_id != patient_id {
            return Err(StoreError::validation(format!(
                "Appointment {appointment_id} does not belong to patient {patient_id}"
            )));
        }
    }

    let record = db::insert_billing_record(
        conn,
        patient_id,
        input.appointment_id,
        amount,
        status,
        non_blank(input.description.as_deref()),
        &now_timestamp(),
    )?;
    tracing::info!(record_id = record.id, patient_id, status = %status, "Billing record created");
    Ok(record)
}

pub fn get_billing_records(conn: &Connection) -> Result<Vec<BillingRecord>, StoreError> {
    Ok(db::get_all_billing_records(conn)?)
}

pub fn get_billing_summary(conn: &Connection) -> Result<BillingSummary, StoreError> {
    let records = db::get_all_billing_records(conn)?;

    let mut total_billed = 0.0;
    let mut total_paid = 0.0;
    let mut total_outstanding = 0.0;
    let mut counts_by_status: BTreeMap<String, usize> = [BillingStatus::Paid, BillingStatus::Outstanding]
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut billed_appointments = HashSet::new();
    let mut monthly: BTreeMap<&str, MonthlyTotal> = BTreeMap::new();

    for record in &records {
        total_billed += record.amount;
        *counts_by_status.entry(record.status.as_str().to_string()).or_default() += 1;
        if let Some(id) = record.appointment_id {
            billed_appointments.insert(id);
        }

        let month_key = record.created_at.get(..7).unwrap_or(record.created_at.as_str());
        let month = monthly.entry(month_key).or_insert_with(|| MonthlyTotal {
            month: month_key.to_string(),
            billed: 0.0,
            paid: 0.0,
            outstanding: 0.0,
        });
        month.billed += record.amount;

        match record.status {
            BillingStatus::Paid => {
                total_paid += record.amount;
                month.paid += record.amount;
            }
            BillingStatus::Outstanding => {
                total_outstanding += record.amount;
                month.outstanding += record.amount;
            }
        }
    }

    let record_count = records.len();
    Ok(BillingSummary {
        total_billed,
        total_paid,
        total_outstanding,
        record_count,
        counts_by_status,
        payments_received: db::total_payments(conn)?,
        average_bill: if record_count == 0 {
            0.0
        } else {
            total_billed / record_count as f64
        },
        billed_appointments: billed_appointments.len(),
        active_appointments: db::count_active_appointments(conn)?,
        monthly: monthly.into_values().collect(),
    })
}

// ═══════════════════════════════════════════
// Payments & statements
// ═══════════════════════════════════════════

pub fn record_payment(
    conn: &Connection,
    patient_id: i64,
    input: &PaymentInput,
) -> Result<Payment, StoreError> {
    let amount = parse_amount(input.amount.as_ref())?;
    let method = match non_blank(input.method.as_deref()) {
        None => PaymentMethod::Cash,
        Some(raw) => PaymentMethod::from_str(&raw.to_lowercase())
            .map_err(|_| StoreError::validation(format!("Unknown payment method '{raw}'")))?,
    };
    directory::ensure_patient(conn, patient_id)?;

    let payment = db::insert_payment(
        conn,
        patient_id,
        amount,
        method,
        non_blank(input.description.as_deref()),
        &now_timestamp(),
    )?;
    tracing::info!(payment_id = payment.id, patient_id, method = %method, "Payment recorded");
    Ok(payment)
}

pub fn issue_statement(
    conn: &Connection,
    patient_id: i64,
    input: &StatementInput,
) -> Result<Statement, StoreError> {
    let amount = parse_amount(input.amount.as_ref())?;
    let description = required(input.description.as_deref(), "description")?;
    directory::ensure_patient(conn, patient_id)?;

    let statement = db::insert_statement(conn, patient_id, amount, description, &now_timestamp())?;
    tracing::info!(statement_id = statement.id, patient_id, "Statement issued");
    Ok(statement)
}

pub fn get_patient_payments(conn: &Connection, patient_id: i64) -> Result<Vec<Payment>, StoreError> {
    Ok(db::get_payments_for_patient(conn, patient_id)?)
}

pub fn get_patient_statements(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Statement>, StoreError> {
    Ok(db::get_statements_for_patient(conn, patient_id)?)
}
