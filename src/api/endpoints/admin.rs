//! Admin dashboard endpoints. Every route takes an `admin_token` query
//! parameter and is gated on the admin role.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::endpoints::{require_admin, required};
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::db::repository::{account, booking, prediction};

#[derive(Deserialize)]
pub struct AdminQuery {
    pub admin_token: Option<String>,
}

/// `GET /api/admin/overview` — headline counts for the dashboard cards.
pub async fn overview(
    State(state): State<AppState>,
    Query(q): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;

    Ok(Json(json!({
        "success": true,
        "overview": {
            "registeredPatients": booking::count_distinct_patients(&conn)?,
            "doctors": account::count_doctors(&conn)?,
            "totalBookings": booking::count_bookings(&conn)?,
            "predictions": prediction::count_predictions(&conn)?,
        }
    })))
}

/// `GET /api/admin/analytics` — last-6-months booking and prediction
/// counts for doctors under this admin, oldest month first.
pub async fn analytics(
    State(state): State<AppState>,
    Query(q): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;

    let bookings: Vec<Value> = booking::monthly_booking_counts(&conn, admin_token)?
        .into_iter()
        .map(|b| json!({ "month": b.month, "bookings": b.count }))
        .collect();
    let predictions: Vec<Value> = prediction::monthly_prediction_counts(&conn, admin_token)?
        .into_iter()
        .map(|p| json!({ "month": p.month, "predictions": p.count }))
        .collect();

    Ok(Json(json!({
        "success": true,
        "chart": { "bookings": bookings, "predictions": predictions }
    })))
}

/// `GET /api/admin/patients` — unique patients that booked with any
/// doctor under this admin.
pub async fn patients(
    State(state): State<AppState>,
    Query(q): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;

    let patients = booking::patients_for_admin(&conn, admin_token)?;
    Ok(Json(json!({ "success": true, "patients": patients })))
}

/// `GET /api/admin/bookings` — bookings under doctors registered by this
/// admin, newest appointment first.
pub async fn bookings(
    State(state): State<AppState>,
    Query(q): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    let admin_token = required(&q.admin_token)?;
    let conn = state.open_db()?;
    require_admin(&conn, admin_token)?;

    let bookings = booking::list_bookings_for_admin(&conn, admin_token)?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}
