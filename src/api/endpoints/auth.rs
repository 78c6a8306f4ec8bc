//! Account endpoints: registration, login, session lookup, doctor
//! management by admins, and the OTP password-reset flow.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::api::endpoints::{require_admin, required, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::codes;
use crate::db::repository::account::{self, NewAccount, NewDoctor, DOCTOR_UPDATE_COLUMNS};
use crate::models::UserPayload;

/// Width of the short doctor-profile columns (department etc.).
const PROFILE_COL_WIDTH: usize = 15;

pub(crate) fn hash_password(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn clip(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

fn send_credentials_mail(state: &AppState, email: &str, password: &str) {
    // Best-effort, like the rest of outbound mail: registration never
    // fails because SMTP is down.
    if let Some(mailer) = state.mailer.clone() {
        let email = email.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = mailer.send_credentials(&email, &password) {
                tracing::warn!(error = %e, "Could not send credentials email");
            }
        });
    }
}

// ─── Registration and login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// `GET /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Query(q): Query<RegisterQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let name = required(&q.name)?;
    let email = required(&q.email)?;
    let password = required(&q.password)?;
    let address = required(&q.address)?;
    let phone = required(&q.phone)?;
    let role = required(&q.role)?;

    let conn = state.open_db()?;
    if account::email_exists(&conn, email)? {
        return Err(ApiError::BadRequest("Email already exists".into()));
    }

    let password_hash = hash_password(password);
    let user_id = codes::generate_code();
    let new_account = NewAccount {
        id: &user_id,
        full_name: name,
        email,
        phone,
        password_hash: &password_hash,
        role,
        address,
    };
    if let Err(e) = account::insert_account(&conn, &new_account) {
        if !e.is_unique_violation() {
            return Err(e.into());
        }
        // Generated id collided, retry once with a fresh one
        let retry_id = codes::generate_code();
        account::insert_account(&conn, &NewAccount { id: &retry_id, ..new_account })?;
    }

    send_credentials_mail(&state, email, password);
    Ok(Json(MessageResponse::new("Registration successful")))
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub identifier: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserPayload,
    /// Legacy scheme: the account id doubles as the session token.
    pub token: String,
}

/// `GET /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Query(q): Query<LoginQuery>,
) -> Result<Json<LoginResponse>, ApiError> {
    let identifier = required(&q.identifier)?;
    let password = required(&q.password)?;
    let role = required(&q.role)?;

    let conn = state.open_db()?;
    let account = account::authenticate(&conn, identifier, &hash_password(password), role)?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = account.id.clone();
    Ok(Json(LoginResponse {
        success: true,
        user: UserPayload::from(&account),
        token,
    }))
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserPayload,
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    Query(q): Query<TokenQuery>,
) -> Result<Json<MeResponse>, ApiError> {
    let token = q
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::InvalidCredentials)?;

    let conn = state.open_db()?;
    let account = account::get_account(&conn, token)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(MeResponse {
        success: true,
        user: UserPayload::from(&account),
    }))
}

// ─── Doctor management (admin-gated) ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterDoctorQuery {
    pub admin_token: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub licence_no: String,
    #[serde(default)]
    pub consultation_fee: String,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterDoctorResponse {
    pub success: bool,
    pub message: String,
    pub doctor_id: String,
}

/// `GET /api/auth/register-doctor`
pub async fn register_doctor(
    State(state): State<AppState>,
    Query(q): Query<RegisterDoctorQuery>,
) -> Result<Json<RegisterDoctorResponse>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let name = required(&q.name)?;
    let email = required(&q.email)?;
    let password = required(&q.password)?;
    let address = required(&q.address)?;
    let phone = required(&q.phone)?;

    let conn = state.open_db()?;
    require_admin(&conn, admin_token).map_err(|_| {
        ApiError::Forbidden("Unauthorized. Only admins can register doctors.".into())
    })?;
    if account::email_exists(&conn, email)? {
        return Err(ApiError::BadRequest("Email already exists".into()));
    }

    let password_hash = hash_password(password);
    let department = clip(&q.department, PROFILE_COL_WIDTH);
    let specialization = clip(&q.specialization, PROFILE_COL_WIDTH);
    let qualification = clip(&q.qualification, PROFILE_COL_WIDTH);
    let experience = clip(&q.experience, PROFILE_COL_WIDTH);

    let doctor_id = codes::generate_code();
    let new_doctor = NewDoctor {
        id: &doctor_id,
        full_name: name,
        email,
        phone,
        password_hash: &password_hash,
        address,
        department: &department,
        specialization: &specialization,
        qualification: &qualification,
        experience: &experience,
        licence_no: &q.licence_no,
        consultation_fee: &q.consultation_fee,
        status: q.status.as_deref().unwrap_or("active"),
        admin_id: admin_token,
    };
    let doctor_id = match account::insert_doctor(&conn, &new_doctor) {
        Ok(()) => doctor_id,
        Err(e) if e.is_unique_violation() => {
            let retry_id = codes::generate_code();
            account::insert_doctor(&conn, &NewDoctor { id: &retry_id, ..new_doctor })?;
            retry_id
        }
        Err(e) => return Err(e.into()),
    };

    send_credentials_mail(&state, email, password);
    Ok(Json(RegisterDoctorResponse {
        success: true,
        message: "Doctor registration successful".into(),
        doctor_id,
    }))
}

#[derive(Deserialize)]
pub struct UpdateDoctorQuery {
    pub admin_token: Option<String>,
    pub doctor_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub licence_no: Option<String>,
    pub consultation_fee: Option<String>,
    pub status: Option<String>,
}

/// `GET /api/auth/update-doctor`
pub async fn update_doctor(
    State(state): State<AppState>,
    Query(q): Query<UpdateDoctorQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let doctor_id = required(&q.doctor_id)?;

    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;

    let supplied = [
        ("name", &q.name),
        ("email", &q.email),
        ("phone", &q.phone),
        ("address", &q.address),
        ("department", &q.department),
        ("specialization", &q.specialization),
        ("qualification", &q.qualification),
        ("experience", &q.experience),
        ("licence_no", &q.licence_no),
        ("consultation_fee", &q.consultation_fee),
        ("status", &q.status),
    ];
    let mut fields: Vec<(&str, String)> = Vec::new();
    for (param, value) in supplied {
        if let Some(value) = value {
            let column = DOCTOR_UPDATE_COLUMNS
                .iter()
                .find(|(p, _)| *p == param)
                .map(|(_, col)| *col)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown field: {param}")))?;
            fields.push((column, value.clone()));
        }
    }
    if fields.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    account::update_doctor_fields(&conn, doctor_id, &fields)?;
    Ok(Json(MessageResponse::new("Doctor updated")))
}

// ─── Password reset (OTP) ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgotPasswordQuery {
    pub email: Option<String>,
}

/// `GET /api/auth/forgot-password` — issue and mail an OTP.
pub async fn forgot_password(
    State(state): State<AppState>,
    Query(q): Query<ForgotPasswordQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = required(&q.email)?;

    let conn = state.open_db()?;
    account::find_by_email(&conn, email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // OTP delivery is required for the reset flow, so this one is not
    // best-effort.
    let mailer = state
        .mailer
        .clone()
        .ok_or_else(|| ApiError::Internal("Email service not configured".into()))?;

    let code = codes::generate_otp();
    let to = email.to_string();
    let outbound = code.clone();
    tokio::task::spawn_blocking(move || mailer.send_otp(&to, &outbound))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(format!("Could not send OTP: {e}")))?;

    // Only a delivered code becomes redeemable; a failed send leaves no
    // live state behind.
    state
        .otp
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?
        .issue(email, &code);

    Ok(Json(MessageResponse::new("OTP sent successfully")))
}

#[derive(Deserialize)]
pub struct ResetPasswordQuery {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub password: Option<String>,
}

/// `GET /api/auth/reset-password` — verify the OTP and set a new password.
pub async fn reset_password(
    State(state): State<AppState>,
    Query(q): Query<ResetPasswordQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = required(&q.email)?;
    let otp = required(&q.otp)?;
    let password = required(&q.password)?;

    let consumed = state
        .otp
        .lock()
        .map_err(|_| ApiError::Internal("lock poisoned".into()))?
        .consume(email, otp);
    if !consumed {
        return Err(ApiError::BadRequest("Invalid or expired OTP".into()));
    }

    let conn = state.open_db()?;
    let account = account::find_by_email(&conn, email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    account::update_password(&conn, &account.id, &hash_password(password))?;

    Ok(Json(MessageResponse::new("Password reset successful")))
}

#[derive(Deserialize)]
pub struct ChangePasswordQuery {
    pub token: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// `GET /api/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    Query(q): Query<ChangePasswordQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = required(&q.token)?;
    let old_password = required(&q.old_password)?;
    let new_password = required(&q.new_password)?;

    let conn = state.open_db()?;
    let account = account::get_account(&conn, token)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    if account.password_hash != hash_password(old_password) {
        return Err(ApiError::InvalidCredentials);
    }
    account::update_password(&conn, &account.id, &hash_password(new_password))?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}
