//! Directory — patient identity, credential lookup, and the doctor roster.
//!
//! Doctors are seed data loaded by migration; patients are created only
//! through `register_patient`. Credentials are stored as salted PBKDF2
//! hashes and never serialized back out.

use rusqlite::Connection;
use serde::Deserialize;

use crate::crypto;
use crate::db::{self, now_timestamp};
use crate::error::{non_blank, required, StoreError};
use crate::models::*;

// ═══════════════════════════════════════════
// Input types
// ═══════════════════════════════════════════

/// Registration form as submitted by the portal.
#[derive(Clone, Default, Deserialize)]
pub struct PatientRegistration {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub demographics: PatientDemographics,
}

impl std::fmt::Debug for PatientRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRegistration")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("demographics", &self.demographics)
            .finish()
    }
}

/// Optional doctor search filters; blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearch {
    pub query: Option<String>,
    pub specialty: Option<String>,
}

// ═══════════════════════════════════════════
// Patients
// ═══════════════════════════════════════════

/// A registration that passed field validation, password already hashed.
///
/// Produced by [`prepare_registration`] outside the store lock so the key
/// derivation never blocks other store operations.
#[derive(Debug, Clone)]
pub struct PreparedRegistration {
    name: String,
    username: String,
    password_hash: String,
    demographics: PatientDemographics,
}

/// Validate the form and hash the password. Needs no connection.
pub fn prepare_registration(
    registration: &PatientRegistration,
) -> Result<PreparedRegistration, StoreError> {
    let name = required(registration.name.as_deref(), "name")?;
    let username = required(registration.username.as_deref(), "username")?;
    let password = registration
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| StoreError::validation("password is required"))?;

    Ok(PreparedRegistration {
        name: name.to_string(),
        username: username.to_string(),
        password_hash: crypto::hash_password(password),
        demographics: normalize_demographics(&registration.demographics),
    })
}

/// Insert a prepared registration; `Conflict` if the username is taken.
pub fn insert_registration(
    conn: &Connection,
    prepared: &PreparedRegistration,
) -> Result<Patient, StoreError> {
    let username = prepared.username.as_str();
    if db::username_taken(conn, username)? {
        return Err(StoreError::Conflict(format!(
            "Username '{username}' is already registered"
        )));
    }

    let patient = db::insert_patient(
        conn,
        &prepared.name,
        username,
        &prepared.password_hash,
        &prepared.demographics,
        &now_timestamp(),
    )?;

    tracing::info!(patient_id = patient.id, "Patient registered");
    Ok(patient)
}

pub fn register_patient(
    conn: &Connection,
    registration: &PatientRegistration,
) -> Result<Patient, StoreError> {
    insert_registration(conn, &prepare_registration(registration)?)
}

/// Stored credentials for `username`, or `None` when blank or unknown.
pub fn lookup_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<(Patient, String)>, StoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Ok(None);
    }
    let credentials = db::get_patient_credentials(conn, username)?;
    if credentials.is_none() {
        tracing::debug!("Login attempt for unknown username");
    }
    Ok(credentials)
}

/// Verify `password` against looked-up credentials. Needs no connection.
pub fn check_credentials(
    credentials: Option<(Patient, String)>,
    password: &str,
) -> Result<Option<Patient>, StoreError> {
    let Some((patient, stored_hash)) = credentials else {
        return Ok(None);
    };
    if password.is_empty() {
        return Ok(None);
    }

    if crypto::verify_password(password, &stored_hash)? {
        tracing::info!(patient_id = patient.id, "Patient logged in");
        Ok(Some(patient))
    } else {
        tracing::debug!(patient_id = patient.id, "Login rejected: wrong password");
        Ok(None)
    }
}

/// Exact credential match. `Ok(None)` is the no-match signal for both an
/// unknown username and a wrong password.
pub fn patient_login(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<Patient>, StoreError> {
    if password.is_empty() {
        return Ok(None);
    }
    check_credentials(lookup_credentials(conn, username)?, password)
}

pub fn get_patient(conn: &Connection, patient_id: i64) -> Result<Patient, StoreError> {
    db::get_patient(conn, patient_id)?.ok_or(StoreError::not_found("Patient", patient_id))
}

pub(crate) fn ensure_patient(conn: &Connection, patient_id: i64) -> Result<(), StoreError> {
    if db::patient_exists(conn, patient_id)? {
        Ok(())
    } else {
        Err(StoreError::not_found("Patient", patient_id))
    }
}

fn normalize_demographics(raw: &PatientDemographics) -> PatientDemographics {
    let clean = |v: &Option<String>| non_blank(v.as_deref()).map(str::to_string);
    PatientDemographics {
        date_of_birth: clean(&raw.date_of_birth),
        gender: clean(&raw.gender),
        email: clean(&raw.email),
        phone: clean(&raw.phone),
        address: clean(&raw.address),
    }
}

// ═══════════════════════════════════════════
// Doctors
// ═══════════════════════════════════════════

/// Case-insensitive substring match of `query` over the doctor's searchable
/// text, AND a case-insensitive exact match on `specialty`.
pub fn search_doctors(conn: &Connection, search: &DoctorSearch) -> Result<Vec<Doctor>, StoreError> {
    let query = non_blank(search.query.as_deref()).map(str::to_lowercase);
    let specialty = non_blank(search.specialty.as_deref()).map(str::to_lowercase);

    let doctors = db::get_all_doctors(conn)?
        .into_iter()
        .filter(|d| {
            specialty
                .as_deref()
                .map_or(true, |s| d.specialty.to_lowercase() == s)
        })
        .filter(|d| query.as_deref().map_or(true, |q| matches_query(d, q)))
        .collect();
    Ok(doctors)
}

fn matches_query(doctor: &Doctor, needle: &str) -> bool {
    [
        Some(doctor.name.as_str()),
        Some(doctor.specialty.as_str()),
        doctor.bio.as_deref(),
        doctor.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn get_specialties(conn: &Connection) -> Result<Vec<String>, StoreError> {
    Ok(db::get_specialties(conn)?)
}

pub fn get_doctor(conn: &Connection, doctor_id: i64) -> Result<Doctor, StoreError> {
    db::get_doctor(conn, doctor_id)?.ok_or(StoreError::not_found("Doctor", doctor_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().expect("in-memory DB")
    }

    fn registration(name: &str, username: &str, password: &str) -> PatientRegistration {
        PatientRegistration {
            name: Some(name.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            demographics: PatientDemographics::default(),
        }
    }

    // ───────────────────────────────────────
    // register_patient
    // ───────────────────────────────────────

    #[test]
    fn password_work_runs_while_store_is_locked() {
        let core = crate::core_state::CoreState::new().unwrap();
        let guard = core.lock_db().unwrap();
        // Neither phase touches the store, so holding the lock cannot stall them.
        let prepared = prepare_registration(&registration("Jane Doe", "jane", "pw")).unwrap();
        drop(guard);

        let patient = core.with_db(|conn| insert_registration(conn, &prepared)).unwrap();
        let credentials = core.with_db(|conn| lookup_credentials(conn, "jane")).unwrap();

        let _guard = core.lock_db().unwrap();
        let matched = check_credentials(credentials.clone(), "pw").unwrap();
        assert_eq!(matched.map(|p| p.id), Some(patient.id));
        assert!(check_credentials(credentials, "nope").unwrap().is_none());
        assert!(check_credentials(None, "pw").unwrap().is_none());
    }

    #[test]
    fn prepare_validates_before_hashing() {
        let err = prepare_registration(&registration("Jane", "jane", "  ")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn insert_registration_rejects_taken_username() {
        let conn = test_db();
        let prepared = prepare_registration(&registration("Jane", "jane", "pw")).unwrap();
        insert_registration(&conn, &prepared).unwrap();
        let err = insert_registration(&conn, &prepared).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn register_returns_record_without_credentials() {
        let conn = test_db();
        let patient = register_patient(&conn, &registration("Jane Doe", "jane", "pw")).unwrap();
        assert_eq!(patient.name, "Jane Doe");
        assert_eq!(patient.username, "jane");

        let json = serde_json::to_value(&patient).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn register_ids_strictly_increase() {
        let conn = test_db();
        let mut last = 0;
        for i in 0..5 {
            let p = register_patient(&conn, &registration("P", &format!("user{i}"), "pw")).unwrap();
            assert!(p.id > last);
            last = p.id;
        }
    }

    #[test]
    fn register_requires_identity_fields() {
        let conn = test_db();
        for reg in [
            registration("", "jane", "pw"),
            registration("Jane", "  ", "pw"),
            registration("Jane", "jane", ""),
            PatientRegistration::default(),
        ] {
            let err = register_patient(&conn, &reg).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
        }
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM patients", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0, "validation failures must not write");
    }

    #[test]
    fn register_rejects_duplicate_username() {
        let conn = test_db();
        register_patient(&conn, &registration("Jane", "jane", "pw")).unwrap();
        let err = register_patient(&conn, &registration("Other Jane", "jane", "pw2")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn register_blank_demographics_become_absent() {
        let conn = test_db();
        let mut reg = registration("Jane", "jane", "pw");
        reg.demographics.email = Some("  ".into());
        reg.demographics.phone = Some(" 555-0100 ".into());
        let patient = register_patient(&conn, &reg).unwrap();
        assert_eq!(patient.demographics.email, None);
        assert_eq!(patient.demographics.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn registration_debug_redacts_password() {
        let reg = registration("Jane", "jane", "hunter2");
        assert!(!format!("{reg:?}").contains("hunter2"));
    }

    // ───────────────────────────────────────
    // patient_login
    // ───────────────────────────────────────

    #[test]
    fn login_matches_exact_credentials() {
        let conn = test_db();
        let jane = register_patient(&conn, &registration("Jane", "jane", "s3cret")).unwrap();
        let found = patient_login(&conn, "jane", "s3cret").unwrap().unwrap();
        assert_eq!(found.id, jane.id);
    }

    #[test]
    fn login_miss_is_none_not_error() {
        let conn = test_db();
        register_patient(&conn, &registration("Jane", "jane", "s3cret")).unwrap();
        assert!(patient_login(&conn, "jane", "S3CRET").unwrap().is_none());
        assert!(patient_login(&conn, "nobody", "s3cret").unwrap().is_none());
        assert!(patient_login(&conn, "", "").unwrap().is_none());
    }

    // ───────────────────────────────────────
    // Doctors
    // ───────────────────────────────────────

    #[test]
    fn search_without_filters_returns_roster() {
        let conn = test_db();
        let all = search_doctors(&conn, &DoctorSearch::default()).unwrap();
        assert_eq!(all.len(), 7);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn search_query_is_case_insensitive_substring() {
        let conn = test_db();
        let found = search_doctors(
            &conn,
            &DoctorSearch { query: Some("cHeN".into()), specialty: None },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Dr. Sarah Chen");
    }

    #[test]
    fn search_query_covers_bio_text() {
        let conn = test_db();
        let found = search_doctors(
            &conn,
            &DoctorSearch { query: Some("migraine".into()), specialty: None },
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specialty, "Neurology");
    }

    #[test]
    fn search_filters_combine_with_and() {
        let conn = test_db();
        let cardiology = search_doctors(
            &conn,
            &DoctorSearch { query: None, specialty: Some("cardiology".into()) },
        )
        .unwrap();
        assert_eq!(cardiology.len(), 2);

        let both = search_doctors(
            &conn,
            &DoctorSearch { query: Some("weiss".into()), specialty: Some("Cardiology".into()) },
        )
        .unwrap();
        assert_eq!(both.len(), 1);

        let none = search_doctors(
            &conn,
            &DoctorSearch { query: Some("weiss".into()), specialty: Some("Dermatology".into()) },
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn specialty_is_exact_not_substring() {
        let conn = test_db();
        let found = search_doctors(
            &conn,
            &DoctorSearch { query: None, specialty: Some("Cardio".into()) },
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn specialties_are_distinct() {
        let conn = test_db();
        let specialties = get_specialties(&conn).unwrap();
        assert_eq!(specialties.len(), 6);
        assert_eq!(specialties[0], "Cardiology");
    }

    #[test]
    fn unknown_doctor_is_not_found() {
        let conn = test_db();
        assert!(get_doctor(&conn, 1).is_ok());
        assert!(matches!(
            get_doctor(&conn, 999),
            Err(StoreError::NotFound { entity: "Doctor", id: 999 })
        ));
    }
}
