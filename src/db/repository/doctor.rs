use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, name, specialty, bio, location, consultation_fee,
     working_days, day_start, day_end, break_start, break_end, slot_minutes";

pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id"))?;
    let rows = stmt.query_map([], doctor_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            params![id],
            doctor_from_row,
        )
        .optional()?;
    Ok(doctor)
}

/// Distinct specialties in order of first appearance.
pub fn get_specialties(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT specialty FROM doctors GROUP BY specialty ORDER BY MIN(id)",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> Result<Doctor, rusqlite::Error> {
    let working_days: String = row.get(6)?;
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        bio: row.get(3)?,
        location: row.get(4)?,
        consultation_fee: row.get(5)?,
        working_hours: WorkingHours {
            working_days: working_days
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect(),
            day_start: row.get(7)?,
            day_end: row.get(8)?,
            break_start: row.get(9)?,
            break_end: row.get(10)?,
            slot_minutes: row.get(11)?,
        },
    })
}
