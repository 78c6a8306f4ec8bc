//! Role-aware access layer over the legacy `prediction` table.
//!
//! Writes go through the fixed-width truncation boundaries of the frozen
//! schema (10-char doctor column, 100-char symptoms column) and the
//! `encoding` codec; reads select their query shape from the caller's
//! role and map raw rows into one uniform view for history listings,
//! doctor dashboards and PDF export.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::repository::{account, prediction as rows};
use crate::db::DatabaseError;
use crate::models::Role;
use crate::prediction::encoding::{decode, encode, Confidence};

/// Width of the legacy `doctor` column. Stored names never exceed this;
/// two doctors sharing a 10-char prefix are indistinguishable on read.
pub const DOCTOR_COL_WIDTH: usize = 10;

/// Width of the legacy `symptoms` column. Truncation is a hard cut and
/// may split a symptom mid-word; that loss is part of the contract.
pub const SYMPTOMS_COL_WIDTH: usize = 100;

/// Status written on every new record.
pub const SAVED_STATUS: &str = "completed";

/// Status shown when a stored record has none.
const DEFAULT_STATUS: &str = "Completed";

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown subject: {0}")]
    SubjectNotFound(String),

    #[error("Prediction not found")]
    RecordNotFound,

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Inputs for saving one prediction record.
#[derive(Debug, Default)]
pub struct SavePrediction<'a> {
    pub subject_id: &'a str,
    pub disease_name: &'a str,
    pub symptoms: &'a str,
    pub severity: &'a str,
    /// Attending doctor supplied by a non-doctor caller. Ignored when the
    /// subject's own role is doctor (their display name wins).
    pub doctor_name: Option<&'a str>,
    pub confidence: Option<Confidence>,
}

/// One decoded record as consumed by history listings and dashboards.
/// Field names match the legacy JSON wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionView {
    pub id: String,
    pub date: Option<String>,
    pub prediction: String,
    pub symptoms: Vec<String>,
    pub severity: String,
    pub status: String,
    pub doctor: String,
    pub confidence: Confidence,
}

/// Structured input for the PDF report renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub subject_id: String,
    pub recorded_at: Option<NaiveDateTime>,
    pub date: String,
    pub disease_name: String,
    pub confidence: Confidence,
    pub severity: String,
    pub status: String,
    pub doctor: String,
    pub symptoms: Vec<String>,
}

/// Save a new prediction record and return the store-assigned timestamp.
///
/// The subject must resolve to a known account; its role decides the
/// stored doctor attribution. Records are immutable once written.
pub fn save_prediction(
    conn: &Connection,
    request: &SavePrediction<'_>,
) -> Result<NaiveDateTime, PredictionError> {
    require(request.subject_id, "subject_id")?;
    require(request.disease_name, "disease_name")?;
    require(request.symptoms, "symptoms")?;
    require(request.severity, "severity")?;

    let (role, full_name) = account::role_and_name(conn, request.subject_id)?
        .ok_or_else(|| PredictionError::SubjectNotFound(request.subject_id.to_string()))?;

    let doctor = if role == Role::Doctor.as_str() {
        truncate_chars(&full_name, DOCTOR_COL_WIDTH)
    } else {
        match request.doctor_name {
            Some(name) if !name.is_empty() => truncate_chars(name, DOCTOR_COL_WIDTH),
            _ => String::new(),
        }
    };

    let packed = encode(request.disease_name, request.confidence.unwrap_or_default());
    let symptoms = truncate_chars(request.symptoms, SYMPTOMS_COL_WIDTH);

    let recorded_at = rows::insert_prediction(
        conn,
        request.subject_id,
        &packed,
        &symptoms,
        request.severity,
        SAVED_STATUS,
        &doctor,
    )?;
    tracing::info!(subject = request.subject_id, "Prediction saved");
    Ok(recorded_at)
}

/// Fetch decoded prediction history for a caller, newest first.
///
/// The caller's role picks the query shape: a doctor sees every record
/// attributed to their (truncated) display name; anyone else sees the
/// records stored under their own id. An unknown caller simply gets an
/// empty subject-scoped history.
pub fn fetch_predictions(
    conn: &Connection,
    caller_id: &str,
) -> Result<Vec<PredictionView>, PredictionError> {
    let raw = match account::role_and_name(conn, caller_id)? {
        Some((role, full_name)) if role == Role::Doctor.as_str() => {
            rows::rows_by_doctor(conn, &truncate_chars(&full_name, DOCTOR_COL_WIDTH))?
        }
        _ => rows::rows_by_subject(conn, caller_id)?,
    };
    Ok(raw.into_iter().map(view_from_row).collect())
}

/// Select the most recent record for a subject (optionally pinned to a
/// calendar date) and decode it into a report payload for PDF rendering.
pub fn render_prediction_report(
    conn: &Connection,
    subject_id: &str,
    date: Option<&str>,
) -> Result<ReportPayload, PredictionError> {
    let row = rows::latest_for_subject(conn, subject_id, date)?
        .ok_or(PredictionError::RecordNotFound)?;

    let decoded = decode(&row.predicted_disease);
    // The report splits on bare commas and trims, unlike the history
    // listing's exact ", " split — both preserved from the wire contract.
    let symptoms = row
        .symptoms
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(ReportPayload {
        subject_id: row.subject_id,
        recorded_at: row.recorded_at,
        date: row
            .recorded_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
        disease_name: decoded.name,
        confidence: decoded.confidence,
        severity: row.severity.unwrap_or_default(),
        status: row.status.unwrap_or_default(),
        doctor: row.doctor.unwrap_or_default(),
        symptoms,
    })
}

fn view_from_row(row: rows::PredictionRow) -> PredictionView {
    let decoded = decode(&row.predicted_disease);
    let symptoms = match row.symptoms.as_deref() {
        Some(s) if !s.is_empty() => s.split(", ").map(str::to_string).collect(),
        _ => Vec::new(),
    };
    PredictionView {
        id: row.subject_id,
        date: row.recorded_at.map(|d| d.format("%Y-%m-%d").to_string()),
        prediction: decoded.name,
        symptoms,
        severity: row.severity.unwrap_or_default(),
        status: match row.status {
            Some(status) if !status.is_empty() => status,
            _ => DEFAULT_STATUS.to_string(),
        },
        doctor: row.doctor.unwrap_or_default(),
        confidence: decoded.confidence,
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PredictionError> {
    if value.is_empty() {
        return Err(PredictionError::MissingField(field));
    }
    Ok(value)
}

/// Character-based left truncation, the write-time boundary of the
/// fixed-width legacy columns.
fn truncate_chars(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::account::{insert_account, NewAccount};
    use rusqlite::params;

    fn seed_account(conn: &Connection, id: &str, name: &str, role: &str) {
        insert_account(
            conn,
            &NewAccount {
                id,
                full_name: name,
                email: &format!("{id}@example.com"),
                phone: "",
                password_hash: "h",
                role,
                address: "",
            },
        )
        .unwrap();
    }

    fn stored_column(conn: &Connection, subject: &str, column: &str) -> String {
        conn.query_row(
            &format!("SELECT COALESCE({column}, '') FROM prediction WHERE id = ?1"),
            params![subject],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn backdate(conn: &Connection, disease_prefix: &str, date: &str) {
        conn.execute(
            "UPDATE prediction SET date = ?1 WHERE predicted_disease LIKE ?2 || '%'",
            params![date, disease_prefix],
        )
        .unwrap();
    }

    #[test]
    fn end_to_end_scenario() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");

        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Migraine",
                symptoms: "headache, nausea, light sensitivity",
                severity: "Moderate",
                doctor_name: None,
                confidence: Some(Confidence::new(82.5)),
            },
        )
        .unwrap();

        assert_eq!(stored_column(&conn, "P1", "predicted_disease"), "Migraine|82.5");
        assert_eq!(
            stored_column(&conn, "P1", "symptoms"),
            "headache, nausea, light sensitivity"
        );
        assert_eq!(stored_column(&conn, "P1", "doctor"), "");
        assert_eq!(stored_column(&conn, "P1", "status"), "completed");

        let views = fetch_predictions(&conn, "P1").unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].prediction, "Migraine");
        assert_eq!(views[0].confidence, Confidence::new(82.5));
        assert_eq!(
            views[0].symptoms,
            vec!["headache", "nausea", "light sensitivity"]
        );
        assert_eq!(views[0].severity, "Moderate");
        assert_eq!(views[0].status, "completed");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        let err = save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Flu",
                symptoms: "cough",
                severity: "",
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, PredictionError::MissingField("severity")));
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "ghost",
                disease_name: "Flu",
                symptoms: "cough",
                severity: "Mild",
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, PredictionError::SubjectNotFound(_)));
    }

    #[test]
    fn symptoms_truncate_at_100_chars() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        let long: String = "ab".repeat(125); // 250 chars
        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Flu",
                symptoms: &long,
                severity: "Mild",
                ..Default::default()
            },
        )
        .unwrap();
        let stored = stored_column(&conn, "P1", "symptoms");
        assert_eq!(stored.chars().count(), 100);
        assert_eq!(stored, long.chars().take(100).collect::<String>());
    }

    #[test]
    fn doctor_caller_name_truncates_at_10_chars() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "D1", "Dr. Alexandra Whitmore", "doctor");
        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "D1",
                disease_name: "Flu",
                symptoms: "cough",
                severity: "Mild",
                // Explicit name loses to the doctor's own display name
                doctor_name: Some("Somebody Else"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(stored_column(&conn, "D1", "doctor"), "Dr. Alexan");
    }

    #[test]
    fn explicit_doctor_name_truncates_for_patients() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Flu",
                symptoms: "cough",
                severity: "Mild",
                doctor_name: Some("Dr. Alexandra Whitmore"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(stored_column(&conn, "P1", "doctor"), "Dr. Alexan");
    }

    #[test]
    fn query_shape_switches_on_role() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        seed_account(&conn, "D1", "Dr. Alexandra Whitmore", "doctor");

        // Patient saves one record naming the doctor; doctor saves one of their own
        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Flu",
                symptoms: "cough",
                severity: "Mild",
                doctor_name: Some("Dr. Alexandra Whitmore"),
                ..Default::default()
            },
        )
        .unwrap();
        save_prediction(
            &conn,
            &SavePrediction {
                subject_id: "P1",
                disease_name: "Cold",
                symptoms: "sneeze",
                severity: "Mild",
                ..Default::default()
            },
        )
        .unwrap();

        // Doctor sees only the record attributed to their truncated name
        let doctor_view = fetch_predictions(&conn, "D1").unwrap();
        assert_eq!(doctor_view.len(), 1);
        assert_eq!(doctor_view[0].prediction, "Flu");

        // Patient sees everything stored under their own id
        let patient_view = fetch_predictions(&conn, "P1").unwrap();
        assert_eq!(patient_view.len(), 2);

        // Unknown caller gets an empty subject-scoped history, not an error
        assert!(fetch_predictions(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn empty_symptoms_decode_to_empty_sequence() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        conn.execute(
            "INSERT INTO prediction (id, predicted_disease, symptoms, severity, status, doctor)
             VALUES ('P1', 'Flu', NULL, 'Mild', '', NULL)",
            [],
        )
        .unwrap();

        let views = fetch_predictions(&conn, "P1").unwrap();
        assert_eq!(views.len(), 1);
        assert!(views[0].symptoms.is_empty());
        // Legacy record without packing decodes to the default confidence
        assert_eq!(views[0].confidence, Confidence::default());
        // Empty status defaults on read
        assert_eq!(views[0].status, "Completed");
        assert_eq!(views[0].doctor, "");
    }

    #[test]
    fn history_is_newest_first() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        for disease in ["First", "Second", "Third"] {
            save_prediction(
                &conn,
                &SavePrediction {
                    subject_id: "P1",
                    disease_name: disease,
                    symptoms: "s",
                    severity: "Mild",
                    ..Default::default()
                },
            )
            .unwrap();
        }
        backdate(&conn, "First", "2026-01-01 08:00:00");
        backdate(&conn, "Second", "2026-01-02 08:00:00");
        backdate(&conn, "Third", "2026-01-03 08:00:00");

        let views = fetch_predictions(&conn, "P1").unwrap();
        let names: Vec<&str> = views.iter().map(|v| v.prediction.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
    }

    #[test]
    fn report_selects_latest_and_honors_date_filter() {
        let conn = open_memory_database().unwrap();
        seed_account(&conn, "P1", "John Doe", "patient");
        for disease in ["Old", "New"] {
            save_prediction(
                &conn,
                &SavePrediction {
                    subject_id: "P1",
                    disease_name: disease,
                    symptoms: "headache,nausea",
                    severity: "Moderate",
                    ..Default::default()
                },
            )
            .unwrap();
        }
        backdate(&conn, "Old", "2026-01-01 09:15:00");
        backdate(&conn, "New", "2026-01-07 14:30:00");

        let latest = render_prediction_report(&conn, "P1", None).unwrap();
        assert_eq!(latest.disease_name, "New");
        assert_eq!(latest.date, "2026-01-07 14:30");
        // Report splits on bare commas with trimming
        assert_eq!(latest.symptoms, vec!["headache", "nausea"]);

        let pinned = render_prediction_report(&conn, "P1", Some("2026-01-01")).unwrap();
        assert_eq!(pinned.disease_name, "Old");

        let missing = render_prediction_report(&conn, "P1", Some("2025-12-25"));
        assert!(matches!(missing, Err(PredictionError::RecordNotFound)));
    }
}
