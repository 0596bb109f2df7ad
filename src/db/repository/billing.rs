use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const BILLING_COLUMNS: &str =
    "id, patient_id, appointment_id, amount, status, description, created_at";

pub fn insert_billing_record(
    conn: &Connection,
    patient_id: i64,
    appointment_id: Option<i64>,
    amount: f64,
    status: BillingStatus,
    description: Option<&str>,
    created_at: &str,
) -> Result<BillingRecord, DatabaseError> {
    conn.execute(
        "INSERT INTO billing_records (patient_id, appointment_id, amount, status, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![patient_id, appointment_id, amount, status.as_str(), description, created_at],
    )?;
    let id = conn.last_insert_rowid();
    get_billing_record(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "BillingRecord".into(),
        id: id.to_string(),
    })
}

pub fn get_billing_record(
    conn: &Connection,
    id: i64,
) -> Result<Option<BillingRecord>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {BILLING_COLUMNS} FROM billing_records WHERE id = ?1"),
            params![id],
            billing_row_from_rusqlite,
        )
        .optional()?;
    row.map(billing_from_row).transpose()
}

pub fn get_all_billing_records(conn: &Connection) -> Result<Vec<BillingRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BILLING_COLUMNS} FROM billing_records ORDER BY id"
    ))?;
    let rows = stmt.query_map([], billing_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(billing_from_row(row?)?);
    }
    Ok(records)
}

// ── Payments ─────────────────────────────────────────────

pub fn insert_payment(
    conn: &Connection,
    patient_id: i64,
    amount: f64,
    method: PaymentMethod,
    description: Option<&str>,
    date: &str,
) -> Result<Payment, DatabaseError> {
    conn.execute(
        "INSERT INTO payments (patient_id, amount, method, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_id, amount, method.as_str(), description, date],
    )?;
    let id = conn.last_insert_rowid();
    let row = conn.query_row(
        "SELECT id, patient_id, amount, method, description, date FROM payments WHERE id = ?1",
        params![id],
        payment_row_from_rusqlite,
    )?;
    payment_from_row(row)
}

pub fn get_payments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Payment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, amount, method, description, date
         FROM payments WHERE patient_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![patient_id], payment_row_from_rusqlite)?;

    let mut payments = Vec::new();
    for row in rows {
        payments.push(payment_from_row(row?)?);
    }
    Ok(payments)
}

/// Sum of every payment received, across all patients.
pub fn total_payments(conn: &Connection) -> Result<f64, DatabaseError> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM payments",
        [],
        |row| row.get::<_, f64>(0),
    )?;
    Ok(total)
}

// ── Statements ───────────────────────────────────────────

pub fn insert_statement(
    conn: &Connection,
    patient_id: i64,
    amount: f64,
    description: &str,
    date: &str,
) -> Result<Statement, DatabaseError> {
    conn.execute(
        "INSERT INTO statements (patient_id, amount, description, date) VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, amount, description, date],
    )?;
    let id = conn.last_insert_rowid();
    let statement = conn.query_row(
        "SELECT id, patient_id, amount, description, date FROM statements WHERE id = ?1",
        params![id],
        statement_from_row,
    )?;
    Ok(statement)
}

pub fn get_statements_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Statement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, amount, description, date
         FROM statements WHERE patient_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![patient_id], statement_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn statement_from_row(row: &rusqlite::Row<'_>) -> Result<Statement, rusqlite::Error> {
    Ok(Statement {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
    })
}

// Internal row types for enum-bearing tables
struct BillingRow {
    id: i64,
    patient_id: i64,
    appointment_id: Option<i64>,
    amount: f64,
    status: String,
    description: Option<String>,
    created_at: String,
}

fn billing_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<BillingRow, rusqlite::Error> {
    Ok(BillingRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        appointment_id: row.get(2)?,
        amount: row.get(3)?,
        status: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn billing_from_row(row: BillingRow) -> Result<BillingRecord, DatabaseError> {
    Ok(BillingRecord {
        id: row.id,
        patient_id: row.patient_id,
        appointment_id: row.appointment_id,
        amount: row.amount,
        status: BillingStatus::from_str(&row.status)?,
        description: row.description,
        created_at: row.created_at,
    })
}

struct PaymentRow {
    id: i64,
    patient_id: i64,
    amount: f64,
    method: String,
    description: Option<String>,
    date: String,
}

fn payment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PaymentRow, rusqlite::Error> {
    Ok(PaymentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        amount: row.get(2)?,
        method: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
    })
}

fn payment_from_row(row: PaymentRow) -> Result<Payment, DatabaseError> {
    Ok(Payment {
        id: row.id,
        patient_id: row.patient_id,
        amount: row.amount,
        method: PaymentMethod::from_str(&row.method)?,
        description: row.description,
        date: row.date,
    })
}
