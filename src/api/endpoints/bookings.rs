//! Appointment booking endpoints.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::endpoints::{required, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::codes;
use crate::db::repository::booking;

/// Compose an appointment timestamp from the legacy `date` (YYYY-MM-DD)
/// and `time` (HH:MM) parameters.
fn parse_appointment(date: &str, time: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(&format!("{date}T{time}:00"), "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| ApiError::BadRequest("Invalid date/time format".into()))
}

#[derive(Deserialize)]
pub struct CreateQuery {
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub department: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub message: String,
    pub booking_id: String,
}

/// `GET /api/bookings/create`
pub async fn create(
    State(state): State<AppState>,
    Query(q): Query<CreateQuery>,
) -> Result<Json<CreateResponse>, ApiError> {
    let patient_name = required(&q.patient_name)?;
    let doctor_name = required(&q.doctor_name)?;
    let department = required(&q.department)?;
    let date = required(&q.date)?;
    let time = required(&q.time)?;

    let appointment = parse_appointment(date, time)?;
    let booking_id = codes::generate_code();

    let conn = state.open_db()?;
    booking::insert_booking(&conn, &booking_id, patient_name, doctor_name, department, appointment)?;

    Ok(Json(CreateResponse {
        success: true,
        message: "Booking created".into(),
        booking_id,
    }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub doctor_name: Option<String>,
}

/// `GET /api/bookings` — all bookings, optionally filtered to one doctor.
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.open_db()?;
    let doctor = q.doctor_name.as_deref().filter(|d| !d.is_empty());
    let bookings = booking::list_bookings(&conn, doctor)?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub booking_id: Option<String>,
    pub status: Option<String>,
}

/// `GET /api/bookings/update-status`
pub async fn update_status(
    State(state): State<AppState>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let booking_id = required(&q.booking_id)?;
    let status = required(&q.status)?;

    let conn = state.open_db()?;
    booking::update_status(&conn, booking_id, &status.to_lowercase())?;
    Ok(Json(MessageResponse::new("Status updated")))
}

#[derive(Deserialize)]
pub struct RescheduleQuery {
    pub booking_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// `GET /api/bookings/update-appointment` — reschedule; the booking drops
/// back to pending.
pub async fn update_appointment(
    State(state): State<AppState>,
    Query(q): Query<RescheduleQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let booking_id = required(&q.booking_id)?;
    let date = required(&q.date)?;
    let time = required(&q.time)?;

    let appointment = parse_appointment(date, time)?;
    let conn = state.open_db()?;
    booking::update_appointment(&conn, booking_id, appointment)?;
    Ok(Json(MessageResponse::new("Appointment updated")))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub booking_id: Option<String>,
}

/// `GET /api/bookings/delete`
pub async fn delete(
    State(state): State<AppState>,
    Query(q): Query<DeleteQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let booking_id = required(&q.booking_id)?;
    let conn = state.open_db()?;
    booking::delete_booking(&conn, booking_id)?;
    Ok(Json(MessageResponse::new("Booking deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointment_parses_date_and_time() {
        let dt = parse_appointment("2026-03-01", "10:30").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-03-01 10:30:00");
    }

    #[test]
    fn bad_appointment_is_rejected() {
        assert!(parse_appointment("01-03-2026", "10:30").is_err());
        assert!(parse_appointment("2026-03-01", "25:99").is_err());
    }
}
