//! Patient engagement — self-reported check-ins between visits.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::{self, now_timestamp};
use crate::directory;
use crate::error::{non_blank, required, StoreError};
use crate::models::*;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdateInput {
    pub patient_id: Option<i64>,
    pub text: Option<String>,
    pub mood: Option<String>,
    pub symptoms: Option<String>,
}

pub fn create_patient_update(
    conn: &Connection,
    input: &PatientUpdateInput,
) -> Result<PatientUpdate, StoreError> {
    let patient_id = input
        .patient_id
        .ok_or_else(|| StoreError::validation("patient_id is required"))?;
    let text = required(input.text.as_deref(), "text")?;
    directory::ensure_patient(conn, patient_id)?;

    let update = db::insert_patient_update(
        conn,
        patient_id,
        text,
        non_blank(input.mood.as_deref()),
        non_blank(input.symptoms.as_deref()),
        &now_timestamp(),
    )?;
    tracing::info!(update_id = update.id, patient_id, "Patient update recorded");
    Ok(update)
}

/// A patient's check-ins, oldest first.
pub fn get_patient_updates(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PatientUpdate>, StoreError> {
    Ok(db::get_patient_updates_for(conn, patient_id)?)
}

pub fn get_update_by_id(conn: &Connection, update_id: i64) -> Result<PatientUpdate, StoreError> {
    db::get_patient_update(conn, update_id)?.ok_or(StoreError::not_found("PatientUpdate", update_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::directory::{register_patient, PatientRegistration};

    fn setup() -> (Connection, i64) {
        let conn = open_memory_database().expect("in-memory DB");
        let id = register_patient(
            &conn,
            &PatientRegistration {
                name: Some("Jane Doe".into()),
                username: Some("jane".into()),
                password: Some("pw".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .id;
        (conn, id)
    }

    fn update(patient_id: i64, text: &str) -> PatientUpdateInput {
        PatientUpdateInput {
            patient_id: Some(patient_id),
            text: Some(text.into()),
            mood: Some("tired".into()),
            symptoms: Some("  ".into()),
        }
    }

    #[test]
    fn create_then_fetch() {
        let (conn, jane) = setup();
        let created = create_patient_update(&conn, &update(jane, "Headache eased")).unwrap();
        assert_eq!(created.mood.as_deref(), Some("tired"));
        assert_eq!(created.symptoms, None);
        assert_eq!(get_update_by_id(&conn, created.id).unwrap(), created);
    }

    #[test]
    fn create_validates_before_lookup() {
        let (conn, jane) = setup();
        let mut no_patient = update(jane, "x");
        no_patient.patient_id = None;
        assert!(matches!(
            create_patient_update(&conn, &no_patient),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            create_patient_update(&conn, &update(jane, "   ")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            create_patient_update(&conn, &update(jane + 1, "hello")),
            Err(StoreError::NotFound { entity: "Patient", .. })
        ));
        assert!(get_patient_updates(&conn, jane).unwrap().is_empty());
    }

    #[test]
    fn updates_are_chronological_per_patient() {
        let (conn, jane) = setup();
        let first = create_patient_update(&conn, &update(jane, "Day 1")).unwrap();
        let second = create_patient_update(&conn, &update(jane, "Day 2")).unwrap();
        let list = get_patient_updates(&conn, jane).unwrap();
        assert_eq!(list, vec![first, second]);
        assert!(get_patient_updates(&conn, 999).unwrap().is_empty());
    }

    #[test]
    fn unknown_update_is_not_found() {
        let (conn, _) = setup();
        assert!(matches!(
            get_update_by_id(&conn, 5),
            Err(StoreError::NotFound { entity: "PatientUpdate", id: 5 })
        ));
    }
}
