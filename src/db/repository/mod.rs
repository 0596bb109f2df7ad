//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per table family. Functions take a borrowed
//! `Connection` so callers decide the locking scope; all public
//! functions are re-exported here.

mod appointment;
mod audit;
mod billing;
mod doctor;
mod lab_result;
mod medication;
mod patient;
mod patient_update;
mod summary;

// Re-export all public items from sub-modules
pub use appointment::*;
pub use audit::*;
pub use billing::*;
pub use doctor::*;
pub use lab_result::*;
pub use medication::*;
pub use patient::*;
pub use patient_update::*;
pub use summary::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_patient(conn: &Connection, username: &str) -> Patient {
        insert_patient(
            conn,
            "Jane Doe",
            username,
            "hash",
            &PatientDemographics::default(),
            "2025-06-01T08:00:00.000Z",
        )
        .unwrap()
    }

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = test_db();
        let patient = make_patient(&conn, "jane");
        let fetched = get_patient(&conn, patient.id).unwrap().unwrap();
        assert_eq!(fetched, patient);
        assert!(patient_exists(&conn, patient.id).unwrap());
        assert!(!patient_exists(&conn, patient.id + 1).unwrap());
    }

    #[test]
    fn patient_ids_are_not_reused() {
        let conn = test_db();
        let first = make_patient(&conn, "first");
        conn.execute("DELETE FROM patients WHERE id = ?1", [first.id]).unwrap();
        let second = make_patient(&conn, "second");
        assert!(second.id > first.id);
    }

    #[test]
    fn credentials_lookup_by_username() {
        let conn = test_db();
        make_patient(&conn, "jane");
        let (patient, hash) = get_patient_credentials(&conn, "jane").unwrap().unwrap();
        assert_eq!(patient.username, "jane");
        assert_eq!(hash, "hash");
        assert!(get_patient_credentials(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn seeded_doctors_carry_working_hours() {
        let conn = test_db();
        let doctors = get_all_doctors(&conn).unwrap();
        assert_eq!(doctors.len(), 7);
        let first = &doctors[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.working_hours.working_days.len(), 5);
        assert_eq!(first.working_hours.day_start, "09:00");
        assert_eq!(first.working_hours.slot_minutes, 30);
    }

    #[test]
    fn specialties_follow_first_appearance() {
        let conn = test_db();
        let specialties = get_specialties(&conn).unwrap();
        assert_eq!(
            specialties,
            vec![
                "Cardiology",
                "Dermatology",
                "Pediatrics",
                "Orthopedics",
                "Neurology",
                "General Practice",
            ]
        );
    }

    #[test]
    fn cancelling_only_touches_scheduled_rows() {
        let conn = test_db();
        let patient = make_patient(&conn, "jane");
        let appt = insert_appointment(&conn, patient.id, 1, "2025-06-10", "09:00", None, "t0")
            .unwrap();
        assert_eq!(appt.status, AppointmentStatus::Scheduled);

        assert_eq!(mark_appointment_cancelled(&conn, appt.id, "t1").unwrap(), 1);
        assert_eq!(mark_appointment_cancelled(&conn, appt.id, "t2").unwrap(), 0);

        let stored = get_appointment(&conn, appt.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.cancelled_at.as_deref(), Some("t1"));
    }

    #[test]
    fn active_appointments_exclude_cancelled() {
        let conn = test_db();
        let patient = make_patient(&conn, "jane");
        let a = insert_appointment(&conn, patient.id, 1, "2025-06-10", "09:00", None, "t").unwrap();
        insert_appointment(&conn, patient.id, 1, "2025-06-10", "10:00", None, "t").unwrap();
        insert_appointment(&conn, patient.id, 1, "2025-06-11", "09:00", None, "t").unwrap();
        mark_appointment_cancelled(&conn, a.id, "t").unwrap();

        let active = get_active_appointments_for_doctor(&conn, 1, "2025-06-10").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].time, "10:00");
        assert_eq!(count_active_appointments(&conn).unwrap(), 2);
    }

    #[test]
    fn billing_ledger_keeps_insertion_order() {
        let conn = test_db();
        let patient = make_patient(&conn, "jane");
        insert_billing_record(&conn, patient.id, None, 80.0, BillingStatus::Paid, None, "t2")
            .unwrap();
        insert_billing_record(&conn, patient.id, None, 20.0, BillingStatus::Outstanding, None, "t1")
            .unwrap();
        let records = get_all_billing_records(&conn).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 80.0);
        assert_eq!(records[1].status, BillingStatus::Outstanding);
    }

    #[test]
    fn payments_and_statements_scoped_to_patient() {
        let conn = test_db();
        let jane = make_patient(&conn, "jane");
        let john = make_patient(&conn, "john");
        insert_payment(&conn, jane.id, 50.0, PaymentMethod::Card, None, "t").unwrap();
        insert_payment(&conn, john.id, 25.0, PaymentMethod::Cash, None, "t").unwrap();
        insert_statement(&conn, jane.id, 50.0, "June visit", "t").unwrap();

        assert_eq!(get_payments_for_patient(&conn, jane.id).unwrap().len(), 1);
        assert_eq!(get_statements_for_patient(&conn, john.id).unwrap().len(), 0);
        assert_eq!(total_payments(&conn).unwrap(), 75.0);
    }

    #[test]
    fn recent_summaries_are_a_suffix() {
        let conn = test_db();
        for i in 1..=5 {
            insert_summary(&conn, None, "Jane", &format!("s{i}"), "a.pdf", "t").unwrap();
        }
        let recent = get_recent_summaries(&conn, 2).unwrap();
        let texts: Vec<_> = recent.iter().map(|s| s.summary.as_str()).collect();
        assert_eq!(texts, vec!["s4", "s5"]);
        assert_eq!(get_all_summaries(&conn).unwrap().len(), 5);
    }

    #[test]
    fn medication_timeline_filters_by_patient() {
        let conn = test_db();
        let jane = make_patient(&conn, "jane");
        insert_medication_entry(&conn, Some(jane.id), None, "Metformin", None, None, "t2").unwrap();
        insert_medication_entry(&conn, None, None, "Ibuprofen", None, None, "t1").unwrap();

        let all = get_medication_timeline(&conn, None).unwrap();
        assert_eq!(all[0].name, "Ibuprofen");
        let janes = get_medication_timeline(&conn, Some(jane.id)).unwrap();
        assert_eq!(janes.len(), 1);
        assert_eq!(janes[0].name, "Metformin");
    }

    #[test]
    fn test_result_names_are_distinct() {
        let conn = test_db();
        for (name, value) in [("HbA1c", "6.1"), ("LDL", "130"), ("HbA1c", "5.9")] {
            insert_test_result(
                &conn,
                &NewTestResult {
                    patient_id: None,
                    name,
                    value,
                    unit: None,
                    reference_range: None,
                    status: ResultStatus::Unknown,
                    recorded_at: "t",
                },
            )
            .unwrap();
        }
        assert_eq!(get_test_result_names(&conn).unwrap(), vec!["HbA1c", "LDL"]);
        assert_eq!(get_test_result_history(&conn, "HbA1c", None).unwrap().len(), 2);
        assert!(get_test_result_history(&conn, "hba1c", None).unwrap().is_empty());
    }

    #[test]
    fn audit_entries_round_trip() {
        let conn = test_db();
        insert_audit_entries(
            &conn,
            &[
                ("t1".into(), "http".into(), "GET /api/doctors".into(), "status:200".into()),
                ("t2".into(), "http".into(), "POST /api/billing".into(), "status:201".into()),
            ],
        )
        .unwrap();
        let recent = recent_audit_entries(&conn, 1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].2, "POST /api/billing");
    }

    #[test]
    fn prune_keeps_newest_audit_rows() {
        let conn = test_db();
        let rows: Vec<(String, String, String, String)> = (0..5)
            .map(|i| (format!("t{i}"), "api".into(), format!("GET /{i}"), "status:200".into()))
            .collect();
        insert_audit_entries(&conn, &rows).unwrap();
        assert_eq!(prune_audit_log(&conn, 2).unwrap(), 3);
        let kept = recent_audit_entries(&conn, 10).unwrap();
        let actions: Vec<&str> = kept.iter().map(|r| r.2.as_str()).collect();
        assert_eq!(actions, vec!["GET /4", "GET /3"]);
        assert_eq!(prune_audit_log(&conn, 2).unwrap(), 0);
    }
}
