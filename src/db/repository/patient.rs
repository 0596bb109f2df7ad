use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "id, name, username, date_of_birth, gender, email, phone, address, created_at";

pub fn insert_patient(
    conn: &Connection,
    name: &str,
    username: &str,
    password_hash: &str,
    demographics: &PatientDemographics,
    created_at: &str,
) -> Result<Patient, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, username, password_hash, date_of_birth, gender,
         email, phone, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            name,
            username,
            password_hash,
            demographics.date_of_birth,
            demographics.gender,
            demographics.email,
            demographics.phone,
            demographics.address,
            created_at,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_patient(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

pub fn patient_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

pub fn username_taken(conn: &Connection, username: &str) -> Result<bool, DatabaseError> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE username = ?1)",
        params![username],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(taken)
}

/// Patient plus stored credential hash, for login verification only.
pub fn get_patient_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<(Patient, String)>, DatabaseError> {
    let found = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS}, password_hash FROM patients WHERE username = ?1"),
            params![username],
            |row| Ok((patient_from_row(row)?, row.get::<_, String>(9)?)),
        )
        .optional()?;
    Ok(found)
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        demographics: PatientDemographics {
            date_of_birth: row.get(3)?,
            gender: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            address: row.get(7)?,
        },
        created_at: row.get(8)?,
    })
}
