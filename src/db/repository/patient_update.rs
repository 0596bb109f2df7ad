use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const UPDATE_COLUMNS: &str = "id, patient_id, text, mood, symptoms, recorded_at";

pub fn insert_patient_update(
    conn: &Connection,
    patient_id: i64,
    text: &str,
    mood: Option<&str>,
    symptoms: Option<&str>,
    recorded_at: &str,
) -> Result<PatientUpdate, DatabaseError> {
    conn.execute(
        "INSERT INTO patient_updates (patient_id, text, mood, symptoms, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_id, text, mood, symptoms, recorded_at],
    )?;
    let id = conn.last_insert_rowid();
    get_patient_update(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "PatientUpdate".into(),
        id: id.to_string(),
    })
}

pub fn get_patient_update(
    conn: &Connection,
    id: i64,
) -> Result<Option<PatientUpdate>, DatabaseError> {
    let update = conn
        .query_row(
            &format!("SELECT {UPDATE_COLUMNS} FROM patient_updates WHERE id = ?1"),
            params![id],
            update_from_row,
        )
        .optional()?;
    Ok(update)
}

pub fn get_patient_updates_for(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PatientUpdate>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {UPDATE_COLUMNS} FROM patient_updates WHERE patient_id = ?1
         ORDER BY recorded_at, id"
    ))?;
    let rows = stmt.query_map(params![patient_id], update_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn update_from_row(row: &rusqlite::Row<'_>) -> Result<PatientUpdate, rusqlite::Error> {
    Ok(PatientUpdate {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        text: row.get(2)?,
        mood: row.get(3)?,
        symptoms: row.get(4)?,
        recorded_at: row.get(5)?,
    })
}
