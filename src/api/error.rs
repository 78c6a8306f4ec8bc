//! API error types with the legacy `{"success": false, "error": ...}`
//! JSON response shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::prediction::PredictionError;
use crate::report::ReportError;

/// Error response body read by the legacy frontend.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid credentials or role")]
    InvalidCredentials,
    #[error("Unauthorized: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingFields => {
                (StatusCode::BAD_REQUEST, "Missing required fields".to_string())
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials or role".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::MissingField(_) => ApiError::MissingFields,
            PredictionError::SubjectNotFound(_) => ApiError::NotFound("User not found".into()),
            PredictionError::RecordNotFound => ApiError::NotFound("Prediction not found".into()),
            PredictionError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_fields_returns_400() {
        let response = ApiError::MissingFields.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn invalid_credentials_returns_401() {
        let response = ApiError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let response =
            ApiError::Forbidden("Only admins can access this.".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("User not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "User not found");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn prediction_errors_map_to_legacy_messages() {
        let api: ApiError = PredictionError::SubjectNotFound("P9".into()).into();
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let api: ApiError = PredictionError::MissingField("severity").into();
        assert!(matches!(api, ApiError::MissingFields));
    }
}
