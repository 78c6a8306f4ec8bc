use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Account, DoctorListing, DoctorProfile, Role};

/// Columns an admin may update on a doctor profile, keyed by API
/// parameter name. `consulation_fee` keeps the legacy spelling (sic).
pub const DOCTOR_UPDATE_COLUMNS: &[(&str, &str)] = &[
    ("name", "full_name"),
    ("email", "email"),
    ("phone", "phone"),
    ("address", "address"),
    ("department", "department"),
    ("specialization", "specialization"),
    ("qualification", "qualification"),
    ("experience", "experience"),
    ("licence_no", "licence_no"),
    ("consultation_fee", "consulation_fee"),
    ("status", "status"),
];

/// Fields for a patient or admin self-registration.
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub id: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub address: &'a str,
}

/// Fields for an admin-created doctor account.
#[derive(Debug)]
pub struct NewDoctor<'a> {
    pub id: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub address: &'a str,
    pub department: &'a str,
    pub specialization: &'a str,
    pub qualification: &'a str,
    pub experience: &'a str,
    pub licence_no: &'a str,
    pub consultation_fee: &'a str,
    pub status: &'a str,
    pub admin_id: &'a str,
}

pub fn insert_account(conn: &Connection, account: &NewAccount) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO role (id, full_name, email, phone, password, role, address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            account.id,
            account.full_name,
            account.email,
            account.phone,
            account.password_hash,
            account.role,
            account.address,
        ],
    )?;
    Ok(())
}

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO role (id, full_name, email, phone, password, role, address, department,
         specialization, qualification, experience, licence_no, consulation_fee, status, admin_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            doctor.id,
            doctor.full_name,
            doctor.email,
            doctor.phone,
            doctor.password_hash,
            Role::Doctor.as_str(),
            doctor.address,
            doctor.department,
            doctor.specialization,
            doctor.qualification,
            doctor.experience,
            doctor.licence_no,
            doctor.consultation_fee,
            doctor.status,
            doctor.admin_id,
        ],
    )?;
    Ok(())
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT email FROM role WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Identifier may be either the email or the account id (legacy login form).
pub fn authenticate(
    conn: &Connection,
    identifier: &str,
    password_hash: &str,
    role: &str,
) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, phone, password, role, address
         FROM role
         WHERE (email = ?1 OR id = ?1) AND password = ?2 AND role = ?3",
    )?;
    let account = stmt
        .query_row(params![identifier, password_hash, role], account_from_row)
        .optional()?;
    Ok(account)
}

pub fn get_account(conn: &Connection, id: &str) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, phone, password, role, address FROM role WHERE id = ?1",
    )?;
    let account = stmt.query_row(params![id], account_from_row).optional()?;
    Ok(account)
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, phone, password, role, address FROM role WHERE email = ?1",
    )?;
    let account = stmt.query_row(params![email], account_from_row).optional()?;
    Ok(account)
}

/// Identity lookup used by the prediction store: role string + display name.
pub fn role_and_name(
    conn: &Connection,
    id: &str,
) -> Result<Option<(String, String)>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT role, full_name FROM role WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

pub fn is_admin(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    Ok(matches!(
        role_and_name(conn, id)?,
        Some((role, _)) if role == Role::Admin.as_str()
    ))
}

pub fn update_password(
    conn: &Connection,
    id: &str,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE role SET password = ?1 WHERE id = ?2",
        params![password_hash, id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Account".into(),
            id: id.into(),
        });
    }
    Ok(())
}

/// Public doctor directory, ordered by name.
pub fn list_public_doctors(conn: &Connection) -> Result<Vec<DoctorListing>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, COALESCE(department, ''), COALESCE(specialization, ''),
                COALESCE(qualification, ''), COALESCE(experience, ''),
                COALESCE(consulation_fee, ''), COALESCE(status, 'active'), COALESCE(licence_no, '')
         FROM role WHERE role = 'doctor' ORDER BY full_name ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DoctorListing {
            id: row.get(0)?,
            name: row.get(1)?,
            department: row.get(2)?,
            specialization: row.get(3)?,
            qualification: row.get(4)?,
            experience: row.get(5)?,
            consultation_fee: row.get(6)?,
            status: row.get(7)?,
            licence_no: row.get(8)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Doctors registered by the given admin.
pub fn list_doctors_for_admin(
    conn: &Connection,
    admin_id: &str,
) -> Result<Vec<DoctorProfile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, email, COALESCE(phone, ''), COALESCE(address, ''),
                COALESCE(department, ''), COALESCE(specialization, ''),
                COALESCE(qualification, ''), COALESCE(experience, ''),
                COALESCE(licence_no, ''), COALESCE(consulation_fee, ''), COALESCE(status, 'active')
         FROM role WHERE role = 'doctor' AND admin_id = ?1",
    )?;
    let rows = stmt.query_map(params![admin_id], |row| {
        let full_name: String = row.get(1)?;
        Ok(DoctorProfile {
            id: row.get(0)?,
            name: full_name.clone(),
            full_name,
            email: row.get(2)?,
            phone: row.get(3)?,
            address: row.get(4)?,
            department: row.get(5)?,
            specialization: row.get(6)?,
            qualification: row.get(7)?,
            experience: row.get(8)?,
            licence_no: row.get(9)?,
            consultation_fee: row.get(10)?,
            status: row.get(11)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn delete_doctor(conn: &Connection, doctor_id: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM role WHERE id = ?1 AND role = 'doctor'",
        params![doctor_id],
    )?;
    Ok(())
}

/// Partial doctor update. Callers must pass storage column names from
/// `DOCTOR_UPDATE_COLUMNS`; nothing else is accepted.
pub fn update_doctor_fields(
    conn: &Connection,
    doctor_id: &str,
    fields: &[(&str, String)],
) -> Result<(), DatabaseError> {
    if fields.is_empty() {
        return Ok(());
    }
    for (column, _) in fields {
        if !DOCTOR_UPDATE_COLUMNS.iter().any(|(_, col)| col == column) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "not an updatable doctor column: {column}"
            )));
        }
    }
    let assignments: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE role SET {} WHERE id = ?{} AND role = 'doctor'",
        assignments.join(", "),
        fields.len() + 1,
    );
    let mut values: Vec<&dyn rusqlite::types::ToSql> =
        fields.iter().map(|(_, v)| v as &dyn rusqlite::types::ToSql).collect();
    values.push(&doctor_id);
    conn.execute(&sql, values.as_slice())?;
    Ok(())
}

pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM role WHERE role = 'doctor'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        address: row.get(6)?,
    })
}
