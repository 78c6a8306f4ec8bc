//! Doctor directory endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::endpoints::{require_admin, required, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::db::repository::account;

/// `GET /api/doctors` — public directory, ordered by name.
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let conn = state.open_db()?;
    let doctors = account::list_public_doctors(&conn)?;
    Ok(Json(json!({ "success": true, "doctors": doctors })))
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub admin_token: Option<String>,
}

/// `GET /api/auth/get-all-doctors` — doctors registered by this admin.
pub async fn list_for_admin(
    State(state): State<AppState>,
    Query(q): Query<AdminListQuery>,
) -> Result<Json<Value>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;
    let doctors = account::list_doctors_for_admin(&conn, admin_token)?;
    Ok(Json(json!({ "success": true, "doctors": doctors })))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub admin_token: Option<String>,
    pub doctor_id: Option<String>,
}

/// `GET /api/doctors/delete`
pub async fn delete(
    State(state): State<AppState>,
    Query(q): Query<DeleteQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let doctor_id = required(&q.doctor_id)?;

    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;
    account::delete_doctor(&conn, doctor_id)?;
    Ok(Json(MessageResponse::new("Doctor deleted")))
}
