use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const SUMMARY_COLUMNS: &str = "id, patient_id, patient_name, summary, filename, created_at";

pub fn insert_summary(
    conn: &Connection,
    patient_id: Option<i64>,
    patient_name: &str,
    summary: &str,
    filename: &str,
    created_at: &str,
) -> Result<Summary, DatabaseError> {
    conn.execute(
        "INSERT INTO summaries (patient_id, patient_name, summary, filename, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_id, patient_name, summary, filename, created_at],
    )?;
    let id = conn.last_insert_rowid();
    get_summary(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Summary".into(),
        id: id.to_string(),
    })
}

pub fn get_summary(conn: &Connection, id: i64) -> Result<Option<Summary>, DatabaseError> {
    let summary = conn
        .query_row(
            &format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = ?1"),
            params![id],
            summary_from_row,
        )
        .optional()?;
    Ok(summary)
}

pub fn get_all_summaries(conn: &Connection) -> Result<Vec<Summary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {SUMMARY_COLUMNS} FROM summaries ORDER BY id"))?;
    let rows = stmt.query_map([], summary_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// The `limit` most recent summaries, returned oldest first.
pub fn get_recent_summaries(conn: &Connection, limit: i64) -> Result<Vec<Summary>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM (
             SELECT {SUMMARY_COLUMNS} FROM summaries ORDER BY id DESC LIMIT ?1
         ) ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![limit], summary_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> Result<Summary, rusqlite::Error> {
    Ok(Summary {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        summary: row.get(3)?,
        filename: row.get(4)?,
        created_at: row.get(5)?,
    })
}
