use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, date, time, reason, status, created_at, cancelled_at";

pub fn insert_appointment(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    date: &str,
    time: &str,
    reason: Option<&str>,
    created_at: &str,
) -> Result<Appointment, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, date, time, reason, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient_id,
            doctor_id,
            date,
            time,
            reason,
            AppointmentStatus::Scheduled.as_str(),
            created_at,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_appointment(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Appointment".into(),
        id: id.to_string(),
    })
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            appointment_row_from_rusqlite,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

/// Every appointment a patient has ever booked, cancelled ones included.
pub fn get_appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![patient_id], appointment_row_from_rusqlite)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Appointments still occupying a doctor's slots on `date` (anything not cancelled).
pub fn get_active_appointments_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    date: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND status != 'cancelled'
         ORDER BY time, id"
    ))?;
    let rows = stmt.query_map(params![doctor_id, date], appointment_row_from_rusqlite)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Flip a scheduled appointment to cancelled. Returns the number of rows
/// changed, which is 0 unless the appointment was still `scheduled`.
pub fn mark_appointment_cancelled(
    conn: &Connection,
    id: i64,
    cancelled_at: &str,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = 'cancelled', cancelled_at = ?2
         WHERE id = ?1 AND status = 'scheduled'",
        params![id, cancelled_at],
    )?;
    Ok(changed)
}

/// Count of appointments that have not been cancelled.
pub fn count_active_appointments(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE status != 'cancelled'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: String,
    time: String,
    reason: Option<String>,
    status: String,
    created_at: String,
    cancelled_at: Option<String>,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        reason: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        cancelled_at: row.get(8)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        date: row.date,
        time: row.time,
        reason: row.reason,
        status: AppointmentStatus::from_str(&row.status)?,
        created_at: row.created_at,
        cancelled_at: row.cancelled_at,
    })
}
