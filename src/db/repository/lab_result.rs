use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const RESULT_COLUMNS: &str =
    "id, patient_id, name, value, unit, reference_range, status, recorded_at";

pub struct NewTestResult<'a> {
    pub patient_id: Option<i64>,
    pub name: &'a str,
    pub value: &'a str,
    pub unit: Option<&'a str>,
    pub reference_range: Option<&'a str>,
    pub status: ResultStatus,
    pub recorded_at: &'a str,
}

pub fn insert_test_result(
    conn: &Connection,
    result: &NewTestResult<'_>,
) -> Result<TestResult, DatabaseError> {
    conn.execute(
        "INSERT INTO test_results (patient_id, name, value, unit, reference_range, status, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            result.patient_id,
            result.name,
            result.value,
            result.unit,
            result.reference_range,
            result.status.as_str(),
            result.recorded_at,
        ],
    )?;
    let id = conn.last_insert_rowid();
    let row = conn.query_row(
        &format!("SELECT {RESULT_COLUMNS} FROM test_results WHERE id = ?1"),
        params![id],
        result_row_from_rusqlite,
    )?;
    result_from_row(row)
}

/// Distinct test names in order of first recording.
pub fn get_test_result_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT name FROM test_results GROUP BY name ORDER BY MIN(id)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Results for an exact test name, oldest first.
pub fn get_test_result_history(
    conn: &Connection,
    test_name: &str,
    patient_id: Option<i64>,
) -> Result<Vec<TestResult>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESULT_COLUMNS} FROM test_results
         WHERE name = ?1 AND (?2 IS NULL OR patient_id = ?2)
         ORDER BY recorded_at, id"
    ))?;
    let rows = stmt.query_map(params![test_name, patient_id], result_row_from_rusqlite)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row?)?);
    }
    Ok(results)
}

// Internal row type for TestResult mapping
struct ResultRow {
    id: i64,
    patient_id: Option<i64>,
    name: String,
    value: String,
    unit: Option<String>,
    reference_range: Option<String>,
    status: String,
    recorded_at: String,
}

fn result_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ResultRow, rusqlite::Error> {
    Ok(ResultRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        reference_range: row.get(5)?,
        status: row.get(6)?,
        recorded_at: row.get(7)?,
    })
}

fn result_from_row(row: ResultRow) -> Result<TestResult, DatabaseError> {
    Ok(TestResult {
        id: row.id,
        patient_id: row.patient_id,
        name: row.name,
        value: row.value,
        unit: row.unit,
        reference_range: row.reference_range,
        status: ResultStatus::from_str(&row.status)?,
        recorded_at: row.recorded_at,
    })
}
