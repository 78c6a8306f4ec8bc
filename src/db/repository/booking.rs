use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Booking, MonthlyCount, PatientContact};

/// Timestamps are stored in SQLite's own text format so ORDER BY and
/// strftime() work uniformly with store-assigned prediction dates.
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_booking(
    conn: &Connection,
    booking_id: &str,
    patient_name: &str,
    doctor_name: &str,
    department: &str,
    appointment: NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO booking (booking_id, name, doctor, department, appointment)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            booking_id,
            patient_name,
            doctor_name,
            department,
            appointment.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// All bookings, optionally narrowed to one doctor's display name,
/// newest appointment first.
pub fn list_bookings(
    conn: &Connection,
    doctor_name: Option<&str>,
) -> Result<Vec<Booking>, DatabaseError> {
    let bookings = match doctor_name {
        Some(name) => {
            let mut stmt = conn.prepare(
                "SELECT booking_id, name, doctor, COALESCE(department, ''), appointment, status
                 FROM booking WHERE doctor = ?1 ORDER BY appointment DESC",
            )?;
            let rows = stmt.query_map(params![name], booking_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT booking_id, name, doctor, COALESCE(department, ''), appointment, status
                 FROM booking ORDER BY appointment DESC",
            )?;
            let rows = stmt.query_map([], booking_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(bookings)
}

/// Bookings whose doctor was registered by the given admin. Correlation is
/// by full doctor name, as in the legacy schema.
pub fn list_bookings_for_admin(
    conn: &Connection,
    admin_id: &str,
) -> Result<Vec<Booking>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT b.booking_id, b.name, b.doctor, COALESCE(b.department, ''), b.appointment, b.status
         FROM booking b
         JOIN role r ON r.role = 'doctor' AND r.full_name = b.doctor AND r.admin_id = ?1
         ORDER BY b.appointment DESC",
    )?;
    let rows = stmt.query_map(params![admin_id], booking_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_status(
    conn: &Connection,
    booking_id: &str,
    status: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE booking SET status = ?1 WHERE booking_id = ?2",
        params![status, booking_id],
    )?;
    Ok(())
}

/// Re-scheduling puts the booking back into pending for re-confirmation.
pub fn update_appointment(
    conn: &Connection,
    booking_id: &str,
    appointment: NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE booking SET appointment = ?1, status = 'pending' WHERE booking_id = ?2",
        params![appointment.format(DATETIME_FMT).to_string(), booking_id],
    )?;
    Ok(())
}

pub fn delete_booking(conn: &Connection, booking_id: &str) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM booking WHERE booking_id = ?1", params![booking_id])?;
    Ok(())
}

pub fn count_bookings(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM booking", [], |row| row.get(0))?;
    Ok(count)
}

/// Registered patients = distinct names that have at least one booking
/// (legacy definition used by the admin overview).
pub fn count_distinct_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(DISTINCT name) FROM booking", [], |row| row.get(0))?;
    Ok(count)
}

/// Unique patient contacts that booked with any doctor under this admin.
pub fn patients_for_admin(
    conn: &Connection,
    admin_id: &str,
) -> Result<Vec<PatientContact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.full_name, p.email, COALESCE(p.phone, ''), COALESCE(p.address, '')
         FROM booking b
         JOIN role r ON r.role = 'doctor' AND r.full_name = b.doctor AND r.admin_id = ?1
         JOIN role p ON p.role = 'patient' AND p.full_name = b.name
         ORDER BY 1 ASC",
    )?;
    let rows = stmt.query_map(params![admin_id], |row| {
        Ok(PatientContact {
            name: row.get(0)?,
            email: row.get(1)?,
            phone: row.get(2)?,
            address: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Monthly booking counts (most recent 6 months with data, oldest first)
/// for doctors under this admin.
pub fn monthly_booking_counts(
    conn: &Connection,
    admin_id: &str,
) -> Result<Vec<MonthlyCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%m', b.appointment) AS mon, strftime('%Y-%m', b.appointment) AS ym,
                COUNT(*)
         FROM booking b
         JOIN role r ON r.role = 'doctor' AND r.full_name = b.doctor AND r.admin_id = ?1
         WHERE b.appointment IS NOT NULL
         GROUP BY ym ORDER BY ym DESC LIMIT 6",
    )?;
    let rows = stmt.query_map(params![admin_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(2)?))
    })?;
    let mut buckets = Vec::new();
    for row in rows {
        let (month_num, count) = row?;
        buckets.push(MonthlyCount {
            month: month_name(&month_num),
            count,
        });
    }
    buckets.reverse();
    Ok(buckets)
}

/// Map a zero-padded month number to its short English name.
pub(crate) fn month_name(month_num: &str) -> String {
    match month_num {
        "01" => "Jan",
        "02" => "Feb",
        "03" => "Mar",
        "04" => "Apr",
        "05" => "May",
        "06" => "Jun",
        "07" => "Jul",
        "08" => "Aug",
        "09" => "Sep",
        "10" => "Oct",
        "11" => "Nov",
        "12" => "Dec",
        other => other,
    }
    .to_string()
}

fn booking_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        booking_id: row.get(0)?,
        name: row.get(1)?,
        doctor: row.get(2)?,
        department: row.get(3)?,
        appointment: row.get(4)?,
        status: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::account::{insert_account, insert_doctor, NewAccount, NewDoctor};
    use chrono::NaiveDate;

    fn dt(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(chrono::NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    fn seed_doctor(conn: &Connection, id: &str, name: &str, admin_id: &str) {
        insert_doctor(
            conn,
            &NewDoctor {
                id,
                full_name: name,
                email: &format!("{id}@example.com"),
                phone: "",
                password_hash: "h",
                address: "",
                department: "General",
                specialization: "",
                qualification: "",
                experience: "",
                licence_no: "",
                consultation_fee: "",
                status: "active",
                admin_id,
            },
        )
        .unwrap();
    }

    #[test]
    fn create_list_and_filter() {
        let conn = open_memory_database().unwrap();
        insert_booking(&conn, "B1", "John Doe", "Dr. Asha Rao", "Cardiology", dt("2026-03-01", "10:00")).unwrap();
        insert_booking(&conn, "B2", "Jane Roe", "Dr. Ben Oti", "Dermatology", dt("2026-03-02", "11:00")).unwrap();

        let all = list_bookings(&conn, None).unwrap();
        assert_eq!(all.len(), 2);
        // Newest appointment first
        assert_eq!(all[0].booking_id, "B2");

        let asha = list_bookings(&conn, Some("Dr. Asha Rao")).unwrap();
        assert_eq!(asha.len(), 1);
        assert_eq!(asha[0].booking_id, "B1");
    }

    #[test]
    fn status_and_reschedule() {
        let conn = open_memory_database().unwrap();
        insert_booking(&conn, "B1", "John Doe", "Dr. Asha Rao", "Cardiology", dt("2026-03-01", "10:00")).unwrap();

        update_status(&conn, "B1", "confirmed").unwrap();
        assert_eq!(list_bookings(&conn, None).unwrap()[0].status, "confirmed");

        // Re-scheduling resets status to pending
        update_appointment(&conn, "B1", dt("2026-03-05", "09:30")).unwrap();
        let booking = &list_bookings(&conn, None).unwrap()[0];
        assert_eq!(booking.status, "pending");
        assert_eq!(booking.appointment.unwrap(), dt("2026-03-05", "09:30"));

        delete_booking(&conn, "B1").unwrap();
        assert_eq!(count_bookings(&conn).unwrap(), 0);
    }

    #[test]
    fn admin_scoped_views() {
        let conn = open_memory_database().unwrap();
        seed_doctor(&conn, "D1", "Dr. Asha Rao", "A1");
        seed_doctor(&conn, "D2", "Dr. Ben Oti", "A2");
        insert_account(
            &conn,
            &NewAccount {
                id: "P1",
                full_name: "John Doe",
                email: "john@example.com",
                phone: "555",
                password_hash: "h",
                role: "patient",
                address: "Elm St",
            },
        )
        .unwrap();
        insert_booking(&conn, "B1", "John Doe", "Dr. Asha Rao", "General", dt("2026-01-10", "10:00")).unwrap();
        insert_booking(&conn, "B2", "John Doe", "Dr. Ben Oti", "General", dt("2026-02-10", "10:00")).unwrap();

        let a1 = list_bookings_for_admin(&conn, "A1").unwrap();
        assert_eq!(a1.len(), 1);
        assert_eq!(a1[0].booking_id, "B1");

        let patients = patients_for_admin(&conn, "A1").unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].name, "John Doe");

        assert_eq!(count_distinct_patients(&conn).unwrap(), 1);
    }

    #[test]
    fn monthly_counts_oldest_first() {
        let conn = open_memory_database().unwrap();
        seed_doctor(&conn, "D1", "Dr. Asha Rao", "A1");
        insert_booking(&conn, "B1", "P", "Dr. Asha Rao", "", dt("2026-01-10", "10:00")).unwrap();
        insert_booking(&conn, "B2", "P", "Dr. Asha Rao", "", dt("2026-02-10", "10:00")).unwrap();
        insert_booking(&conn, "B3", "P", "Dr. Asha Rao", "", dt("2026-02-20", "10:00")).unwrap();

        let counts = monthly_booking_counts(&conn, "A1").unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].month, "Jan");
        assert_eq!(counts[0].count, 1);
        assert_eq!(counts[1].month, "Feb");
        assert_eq!(counts[1].count, 2);
    }
}
