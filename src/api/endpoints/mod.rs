pub mod admin;
pub mod auth;
pub mod bookings;
pub mod contact;
pub mod doctors;
pub mod predictions;

use rusqlite::Connection;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::db::repository::account;

/// Legacy success envelope for message-only responses.
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Admin-token gate shared by the admin and doctor-management routes.
pub(crate) fn require_admin(conn: &Connection, token: &str) -> Result<(), ApiError> {
    if account::is_admin(conn, token)? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Unauthorized. Only admins can access this.".into(),
        ))
    }
}

/// Non-empty query parameter, or the legacy missing-fields failure.
pub(crate) fn required(value: &Option<String>) -> Result<&str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::MissingFields),
    }
}
