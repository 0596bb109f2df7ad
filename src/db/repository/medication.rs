use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

const MEDICATION_COLUMNS: &str = "id, patient_id, summary_id, name, dosage, frequency, noted_at";

pub fn insert_medication_entry(
    conn: &Connection,
    patient_id: Option<i64>,
    summary_id: Option<i64>,
    name: &str,
    dosage: Option<&str>,
    frequency: Option<&str>,
    noted_at: &str,
) -> Result<MedicationEntry, DatabaseError> {
    conn.execute(
        "INSERT INTO medication_entries (patient_id, summary_id, name, dosage, frequency, noted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![patient_id, summary_id, name, dosage, frequency, noted_at],
    )?;
    let id = conn.last_insert_rowid();
    let entry = conn.query_row(
        &format!("SELECT {MEDICATION_COLUMNS} FROM medication_entries WHERE id = ?1"),
        params![id],
        medication_from_row,
    )?;
    Ok(entry)
}

/// Medication mentions ordered by time; all patients when `patient_id` is `None`.
pub fn get_medication_timeline(
    conn: &Connection,
    patient_id: Option<i64>,
) -> Result<Vec<MedicationEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medication_entries
         WHERE ?1 IS NULL OR patient_id = ?1
         ORDER BY noted_at, id"
    ))?;
    let rows = stmt.query_map(params![patient_id], medication_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn medication_from_row(row: &rusqlite::Row<'_>) -> Result<MedicationEntry, rusqlite::Error> {
    Ok(MedicationEntry {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        summary_id: row.get(2)?,
        name: row.get(3)?,
        dosage: row.get(4)?,
        frequency: row.get(5)?,
        noted_at: row.get(6)?,
    })
}
