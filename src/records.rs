//! Clinical records: archived visit summaries, the medication timeline,
//! and lab test-result history.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{self, now_timestamp, NewTestResult};
use crate::directory;
use crate::error::{non_blank, required, StoreError};
use crate::models::enums::ResultStatus;
use crate::models::*;

// ═══════════════════════════════════════════
// Input types
// ═══════════════════════════════════════════

/// A medication named in a summary or entered on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationMention {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryInput {
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub summary: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub medications: Vec<MedicationMention>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationInput {
    pub patient_id: Option<i64>,
    pub summary_id: Option<i64>,
    #[serde(flatten)]
    pub mention: MedicationMention,
}

/// `value` may be a JSON number or string; `status` overrides derivation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestResultInput {
    pub patient_id: Option<i64>,
    pub name: Option<String>,
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: Option<String>,
}

/// Summary plus the medication entries written with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedSummary {
    #[serde(flatten)]
    pub summary: Summary,
    pub medications: Vec<MedicationEntry>,
}

// ═══════════════════════════════════════════
// Summaries
// ═══════════════════════════════════════════

/// Archive a summary. Mentioned medications are written in the same
/// transaction and linked to the new summary id.
pub fn save_summary(conn: &Connection, input: &SummaryInput) -> Result<SavedSummary, StoreError> {
    let patient_name = required(input.patient_name.as_deref(), "patient_name")?;
    let text = required(input.summary.as_deref(), "summary")?;
    let filename = required(input.filename.as_deref(), "filename")?;
    let mentions = input
        .medications
        .iter()
        .map(|m| Ok((required(m.name.as_deref(), "medication name")?, m)))
        .collect::<Result<Vec<_>, StoreError>>()?;
    if let Some(patient_id) = input.patient_id {
        directory::ensure_patient(conn, patient_id)?;
    }

    let created_at = now_timestamp();
    let tx = conn.unchecked_transaction()?;
    let summary = db::insert_summary(&tx, input.patient_id, patient_name, text, filename, &created_at)?;
    let mut medications = Vec::with_capacity(mentions.len());
    for (name, mention) in mentions {
        medications.push(db::insert_medication_entry(
            &tx,
            input.patient_id,
            Some(summary.id),
            name,
            non_blank(mention.dosage.as_deref()),
            non_blank(mention.frequency.as_deref()),
            &created_at,
        )?);
    }
    tx.commit()?;

    tracing::info!(
        summary_id = summary.id,
        medications = medications.len(),
        "Summary archived"
    );
    Ok(SavedSummary { summary, medications })
}

/// The last `limit` summaries in chronological order, or all of them when
/// `limit` is absent or not positive.
pub fn get_summaries(conn: &Connection, limit: Option<i64>) -> Result<Vec<Summary>, StoreError> {
    let summaries = match limit.filter(|n| *n > 0) {
        Some(n) => db::get_recent_summaries(conn, n)?,
        None => db::get_all_summaries(conn)?,
    };
    Ok(summaries)
}

// ═══════════════════════════════════════════
// Medications
// ═══════════════════════════════════════════

pub fn record_medication(
    conn: &Connection,
    input: &MedicationInput,
) -> Result<MedicationEntry, StoreError> {
    let name = required(input.mention.name.as_deref(), "name")?;
    if let Some(patient_id) = input.patient_id {
        directory::ensure_patient(conn, patient_id)?;
    }
    if let Some(summary_id) = input.summary_id {
        if db::get_summary(conn, summary_id)?.is_none() {
            return Err(StoreError::not_found("Summary", summary_id));
        }
    }

    let entry = db::insert_medication_entry(
        conn,
        input.patient_id,
        input.summary_id,
        name,
        non_blank(input.mention.dosage.as_deref()),
        non_blank(input.mention.frequency.as_deref()),
        &now_timestamp(),
    )?;
    tracing::info!(entry_id = entry.id, "Medication recorded");
    Ok(entry)
}

pub fn get_medications_timeline(
    conn: &Connection,
    patient_id: Option<i64>,
) -> Result<Vec<MedicationEntry>, StoreError> {
    Ok(db::get_medication_timeline(conn, patient_id)?)
}

// ═══════════════════════════════════════════
// Test results
// ═══════════════════════════════════════════

pub fn record_test_result(
    conn: &Connection,
    input: &TestResultInput,
) -> Result<TestResult, StoreError> {
    let name = required(input.name.as_deref(), "name")?;
    let value = match &input.value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => required(Some(s.as_str()), "value")?.to_string(),
        None | Some(Value::Null) => return Err(StoreError::validation("value is required")),
        Some(_) => return Err(StoreError::validation("value must be a number or string")),
    };
    let reference_range = non_blank(input.reference_range.as_deref());
    let status = match non_blank(input.status.as_deref()) {
        Some(raw) => ResultStatus::from_str(&raw.to_lowercase())
            .map_err(|_| StoreError::validation(format!("Unknown result status '{raw}'")))?,
        None => derive_status(&value, reference_range),
    };
    if let Some(patient_id) = input.patient_id {
        directory::ensure_patient(conn, patient_id)?;
    }

    let result = db::insert_test_result(
        conn,
        &NewTestResult {
            patient_id: input.patient_id,
            name,
            value: &value,
            unit: non_blank(input.unit.as_deref()),
            reference_range,
            status,
            recorded_at: &now_timestamp(),
        },
    )?;
    tracing::info!(result_id = result.id, status = %status, "Test result recorded");
    Ok(result)
}

pub fn get_test_result_names(conn: &Connection) -> Result<Vec<String>, StoreError> {
    Ok(db::get_test_result_names(conn)?)
}

/// Chronological history for an exact test name. A positive `limit` keeps
/// only the most recent entries, still oldest first.
pub fn get_test_result_history(
    conn: &Connection,
    test_name: &str,
    patient_id: Option<i64>,
    limit: Option<i64>,
) -> Result<Vec<TestResult>, StoreError> {
    let mut history = db::get_test_result_history(conn, test_name, patient_id)?;
    if let Some(n) = limit.filter(|n| *n > 0) {
        let keep = usize::try_from(n).unwrap_or(usize::MAX);
        if history.len() > keep {
            history.drain(..history.len() - keep);
        }
    }
    Ok(history)
}

/// Classify a numeric value against a reference range such as `70-99`,
/// `<200` or `>40`. Anything not parseable is `Unknown`.
pub fn derive_status(value: &str, reference_range: Option<&str>) -> ResultStatus {
    let Ok(value) = value.trim().parse::<f64>() else {
        return ResultStatus::Unknown;
    };
    let Some((low, high)) = reference_range.and_then(parse_range) else {
        return ResultStatus::Unknown;
    };

    if high.is_some_and(|h| value > h * 2.0) || low.is_some_and(|l| value < l / 2.0) {
        ResultStatus::Critical
    } else if low.is_some_and(|l| value < l) {
        ResultStatus::Low
    } else if high.is_some_and(|h| value > h) {
        ResultStatus::High
    } else {
        ResultStatus::Normal
    }
}

fn parse_range(raw: &str) -> Option<(Option<f64>, Option<f64>)> {
    let raw = raw.trim();
    let num = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());

    if let Some(rest) = raw.strip_prefix('<') {
        return Some((None, Some(num(rest.trim_start_matches('='))?)));
    }
    if let Some(rest) = raw.strip_prefix('>') {
        return Some((Some(num(rest.trim_start_matches('='))?), None));
    }
    let (low, high) = raw.split_once('-')?;
    let (low, high) = (num(low)?, num(high)?);
    (low <= high).then_some((Some(low), Some(high)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use serde_json::json;

    fn test_db() -> Connection {
        open_memory_database().expect("in-memory DB")
    }

    fn summary_input(name: &str) -> SummaryInput {
        SummaryInput {
            patient_name: Some(name.into()),
            summary: Some("Follow-up in two weeks".into()),
            filename: Some("visit.pdf".into()),
            ..Default::default()
        }
    }

    fn mention(name: &str) -> MedicationMention {
        MedicationMention {
            name: Some(name.into()),
            dosage: Some("10mg".into()),
            frequency: Some("daily".into()),
        }
    }

    fn lab(name: &str, value: Value, range: Option<&str>) -> TestResultInput {
        TestResultInput {
            name: Some(name.into()),
            value: Some(value),
            reference_range: range.map(String::from),
            ..Default::default()
        }
    }

    // ── Summaries ────────────────────────────────────────

    #[test]
    fn save_summary_requires_fields() {
        let conn = test_db();
        let mut missing_file = summary_input("Jane");
        missing_file.filename = Some(" ".into());
        for input in [SummaryInput::default(), summary_input(""), missing_file] {
            assert!(matches!(save_summary(&conn, &input), Err(StoreError::Validation(_))));
        }
        assert!(get_summaries(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn summary_limit_returns_tail_in_order() {
        let conn = test_db();
        let ids: Vec<i64> = (0..5)
            .map(|i| save_summary(&conn, &summary_input(&format!("P{i}"))).unwrap().summary.id)
            .collect();

        let last_two = get_summaries(&conn, Some(2)).unwrap();
        assert_eq!(last_two.iter().map(|s| s.id).collect::<Vec<_>>(), ids[3..].to_vec());

        for limit in [None, Some(0), Some(-3)] {
            assert_eq!(get_summaries(&conn, limit).unwrap().len(), 5);
        }
        assert_eq!(get_summaries(&conn, Some(50)).unwrap().len(), 5);
    }

    #[test]
    fn summary_medications_are_linked() {
        let conn = test_db();
        let mut input = summary_input("Jane");
        input.medications = vec![mention("Lisinopril"), mention("Metformin")];
        let saved = save_summary(&conn, &input).unwrap();

        assert_eq!(saved.medications.len(), 2);
        assert!(saved.medications.iter().all(|m| m.summary_id == Some(saved.summary.id)));
        assert_eq!(get_medications_timeline(&conn, None).unwrap().len(), 2);
    }

    #[test]
    fn bad_mention_rolls_back_everything() {
        let conn = test_db();
        let mut input = summary_input("Jane");
        input.medications = vec![mention("Lisinopril"), MedicationMention::default()];
        assert!(matches!(save_summary(&conn, &input), Err(StoreError::Validation(_))));
        assert!(get_summaries(&conn, None).unwrap().is_empty());
        assert!(get_medications_timeline(&conn, None).unwrap().is_empty());
    }

    // ── Medications ──────────────────────────────────────

    #[test]
    fn medication_requires_name_and_known_summary() {
        let conn = test_db();
        assert!(matches!(
            record_medication(&conn, &MedicationInput::default()),
            Err(StoreError::Validation(_))
        ));
        let input = MedicationInput { summary_id: Some(9), mention: mention("Aspirin"), ..Default::default() };
        assert!(matches!(
            record_medication(&conn, &input),
            Err(StoreError::NotFound { entity: "Summary", .. })
        ));
    }

    #[test]
    fn timeline_is_chronological_and_filterable() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO patients (name, username, password_hash, created_at)
             VALUES ('Jane', 'jane', 'x', '2025-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();
        let jane = conn.last_insert_rowid();

        let a = record_medication(
            &conn,
            &MedicationInput { patient_id: Some(jane), mention: mention("A"), ..Default::default() },
        )
        .unwrap();
        let b = record_medication(
            &conn,
            &MedicationInput { mention: mention("B"), ..Default::default() },
        )
        .unwrap();

        let all = get_medications_timeline(&conn, None).unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        let mine = get_medications_timeline(&conn, Some(jane)).unwrap();
        assert_eq!(mine, vec![a]);
    }

    // ── Test results ─────────────────────────────────────

    #[test]
    fn status_derivation() {
        let cases = [
            ("85", Some("70-99"), ResultStatus::Normal),
            ("65", Some("70-99"), ResultStatus::Low),
            ("120", Some("70-99"), ResultStatus::High),
            ("250", Some("70-99"), ResultStatus::Critical),
            ("30", Some("70-99"), ResultStatus::Critical),
            ("180", Some("<200"), ResultStatus::Normal),
            ("210", Some("< 200"), ResultStatus::High),
            ("35", Some(">40"), ResultStatus::Low),
            ("85", None, ResultStatus::Unknown),
            ("positive", Some("70-99"), ResultStatus::Unknown),
            ("85", Some("see notes"), ResultStatus::Unknown),
        ];
        for (value, range, expected) in cases {
            assert_eq!(derive_status(value, range), expected, "{value} in {range:?}");
        }
    }

    #[test]
    fn test_result_accepts_numeric_value() {
        let conn = test_db();
        let result = record_test_result(&conn, &lab("Glucose", json!(105), Some("70-99"))).unwrap();
        assert_eq!(result.value, "105");
        assert_eq!(result.status, ResultStatus::High);
    }

    #[test]
    fn explicit_status_wins() {
        let conn = test_db();
        let mut input = lab("Glucose", json!("85"), Some("70-99"));
        input.status = Some("Critical".into());
        assert_eq!(record_test_result(&conn, &input).unwrap().status, ResultStatus::Critical);
        input.status = Some("weird".into());
        assert!(matches!(record_test_result(&conn, &input), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_result_requires_name_and_value() {
        let conn = test_db();
        assert!(record_test_result(&conn, &lab("", json!(1), None)).is_err());
        assert!(record_test_result(&conn, &lab("HbA1c", json!(""), None)).is_err());
        assert!(record_test_result(&conn, &lab("HbA1c", json!(null), None)).is_err());
        assert!(get_test_result_names(&conn).unwrap().is_empty());
    }

    #[test]
    fn history_is_exact_and_chronological() {
        let conn = test_db();
        for (name, value) in [("Glucose", 90), ("HbA1c", 6), ("Glucose", 95), ("Glucose", 100)] {
            record_test_result(&conn, &lab(name, json!(value), None)).unwrap();
        }

        assert_eq!(get_test_result_names(&conn).unwrap(), vec!["Glucose", "HbA1c"]);

        let history = get_test_result_history(&conn, "Glucose", None, None).unwrap();
        assert_eq!(
            history.iter().map(|r| r.value.as_str()).collect::<Vec<_>>(),
            vec!["90", "95", "100"]
        );
        assert!(get_test_result_history(&conn, "glucose", None, None).unwrap().is_empty());
        assert!(get_test_result_history(&conn, "Cholesterol", None, None).unwrap().is_empty());

        let tail = get_test_result_history(&conn, "Glucose", None, Some(2)).unwrap();
        assert_eq!(
            tail.iter().map(|r| r.value.as_str()).collect::<Vec<_>>(),
            vec!["95", "100"]
        );
    }
}
