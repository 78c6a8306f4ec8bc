use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::MonthlyCount;

/// One raw row of the legacy `prediction` table. `predicted_disease`
/// still carries the packed `disease|confidence` payload; decoding
/// happens in `prediction::encoding`, never here.
#[derive(Debug, Clone)]
pub struct PredictionRow {
    pub subject_id: String,
    pub recorded_at: Option<NaiveDateTime>,
    pub predicted_disease: String,
    pub symptoms: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub doctor: Option<String>,
}

/// Insert a record and return the store-assigned timestamp. Rows are
/// immutable after this point; corrections are new rows.
pub fn insert_prediction(
    conn: &Connection,
    subject_id: &str,
    predicted_disease: &str,
    symptoms: &str,
    severity: &str,
    status: &str,
    doctor: &str,
) -> Result<NaiveDateTime, DatabaseError> {
    let recorded_at = conn.query_row(
        "INSERT INTO prediction (id, predicted_disease, symptoms, severity, status, doctor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING date",
        params![subject_id, predicted_disease, symptoms, severity, status, doctor],
        |row| row.get(0),
    )?;
    Ok(recorded_at)
}

/// All records for one subject, newest first.
pub fn rows_by_subject(
    conn: &Connection,
    subject_id: &str,
) -> Result<Vec<PredictionRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, predicted_disease, symptoms, severity, status, doctor
         FROM prediction WHERE id = ?1 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![subject_id], row_from_sql)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// All records attributed to a stored doctor display name (already
/// truncated to the 10-char column width), newest first.
pub fn rows_by_doctor(
    conn: &Connection,
    doctor_name: &str,
) -> Result<Vec<PredictionRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, predicted_disease, symptoms, severity, status, doctor
         FROM prediction WHERE doctor = ?1 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![doctor_name], row_from_sql)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Most recent record for a subject, optionally pinned to an exact
/// calendar date (YYYY-MM-DD).
pub fn latest_for_subject(
    conn: &Connection,
    subject_id: &str,
    date: Option<&str>,
) -> Result<Option<PredictionRow>, DatabaseError> {
    let row = match date {
        Some(date) => conn
            .query_row(
                "SELECT id, date, predicted_disease, symptoms, severity, status, doctor
                 FROM prediction
                 WHERE id = ?1 AND strftime('%Y-%m-%d', date) = ?2
                 ORDER BY date DESC LIMIT 1",
                params![subject_id, date],
                row_from_sql,
            )
            .optional()?,
        None => conn
            .query_row(
                "SELECT id, date, predicted_disease, symptoms, severity, status, doctor
                 FROM prediction WHERE id = ?1 ORDER BY date DESC LIMIT 1",
                params![subject_id],
                row_from_sql,
            )
            .optional()?,
    };
    Ok(row)
}

pub fn count_predictions(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM prediction", [], |row| row.get(0))?;
    Ok(count)
}

/// Monthly prediction counts (most recent 6 months with data, oldest
/// first) for records attributed to doctors under this admin. The join is
/// on the full doctor name, so only un-truncated names match — a known
/// limitation of the name-correlated legacy schema.
pub fn monthly_prediction_counts(
    conn: &Connection,
    admin_id: &str,
) -> Result<Vec<MonthlyCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%m', p.date) AS mon, strftime('%Y-%m', p.date) AS ym, COUNT(*)
         FROM prediction p
         JOIN role r ON r.role = 'doctor' AND p.doctor = r.full_name AND r.admin_id = ?1
         WHERE p.date IS NOT NULL
         GROUP BY ym ORDER BY ym DESC LIMIT 6",
    )?;
    let rows = stmt.query_map(params![admin_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(2)?))
    })?;
    let mut buckets = Vec::new();
    for row in rows {
        let (month_num, count) = row?;
        buckets.push(MonthlyCount {
            month: super::booking::month_name(&month_num),
            count,
        });
    }
    buckets.reverse();
    Ok(buckets)
}

fn row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRow> {
    Ok(PredictionRow {
        subject_id: row.get(0)?,
        recorded_at: row.get(1)?,
        predicted_disease: row.get(2)?,
        symptoms: row.get(3)?,
        severity: row.get(4)?,
        status: row.get(5)?,
        doctor: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn backdate(conn: &Connection, disease: &str, date: &str) {
        conn.execute(
            "UPDATE prediction SET date = ?1 WHERE predicted_disease = ?2",
            params![date, disease],
        )
        .unwrap();
    }

    #[test]
    fn insert_returns_store_assigned_timestamp() {
        let conn = open_memory_database().unwrap();
        let recorded = insert_prediction(&conn, "P1", "Flu|70", "cough", "Mild", "completed", "")
            .unwrap();
        // Store-assigned, current clock
        assert!(recorded.and_utc().timestamp() > 0);
    }

    #[test]
    fn subject_rows_newest_first() {
        let conn = open_memory_database().unwrap();
        for disease in ["A|70", "B|70", "C|70"] {
            insert_prediction(&conn, "P1", disease, "s", "Mild", "completed", "").unwrap();
        }
        backdate(&conn, "A|70", "2026-01-01 10:00:00");
        backdate(&conn, "B|70", "2026-01-02 10:00:00");
        backdate(&conn, "C|70", "2026-01-03 10:00:00");

        let rows = rows_by_subject(&conn, "P1").unwrap();
        let diseases: Vec<&str> = rows.iter().map(|r| r.predicted_disease.as_str()).collect();
        assert_eq!(diseases, vec!["C|70", "B|70", "A|70"]);
    }

    #[test]
    fn doctor_rows_match_stored_name_only() {
        let conn = open_memory_database().unwrap();
        insert_prediction(&conn, "P1", "Flu|70", "s", "Mild", "completed", "Dr. Asha R").unwrap();
        insert_prediction(&conn, "P2", "Cold|70", "s", "Mild", "completed", "Dr. Ben Ot").unwrap();

        let rows = rows_by_doctor(&conn, "Dr. Asha R").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_id, "P1");
    }

    #[test]
    fn latest_with_and_without_date_filter() {
        let conn = open_memory_database().unwrap();
        insert_prediction(&conn, "P1", "A|70", "s", "Mild", "completed", "").unwrap();
        insert_prediction(&conn, "P1", "B|70", "s", "Mild", "completed", "").unwrap();
        backdate(&conn, "A|70", "2026-01-01 10:00:00");
        backdate(&conn, "B|70", "2026-01-05 10:00:00");

        let latest = latest_for_subject(&conn, "P1", None).unwrap().unwrap();
        assert_eq!(latest.predicted_disease, "B|70");

        let pinned = latest_for_subject(&conn, "P1", Some("2026-01-01")).unwrap().unwrap();
        assert_eq!(pinned.predicted_disease, "A|70");

        assert!(latest_for_subject(&conn, "P1", Some("2026-02-01")).unwrap().is_none());
        assert!(latest_for_subject(&conn, "P9", None).unwrap().is_none());
    }

    #[test]
    fn monthly_counts_joined_by_doctor_name() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO role (id, full_name, email, password, role, admin_id)
             VALUES ('D1', 'Dr. Asha', 'a@example.com', 'h', 'doctor', 'A1')",
            [],
        )
        .unwrap();
        insert_prediction(&conn, "P1", "Flu|70", "s", "Mild", "completed", "Dr. Asha").unwrap();
        insert_prediction(&conn, "P2", "Cold|70", "s", "Mild", "completed", "Dr. Asha").unwrap();
        backdate(&conn, "Flu|70", "2026-02-01 10:00:00");
        backdate(&conn, "Cold|70", "2026-02-15 10:00:00");

        let counts = monthly_prediction_counts(&conn, "A1").unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].month, "Feb");
        assert_eq!(counts[0].count, 2);

        assert!(monthly_prediction_counts(&conn, "A2").unwrap().is_empty());
        assert_eq!(count_predictions(&conn).unwrap(), 2);
    }
}
