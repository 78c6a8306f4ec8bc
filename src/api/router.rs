//! Route table and CORS policy.
//!
//! Every endpoint is a GET with query-string parameters; that wire shape
//! is frozen by the deployed frontend.

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::endpoints::{admin, auth, bookings, contact, doctors, predictions};
use crate::api::types::AppState;
use crate::config;

pub fn api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config::allowed_origins()
                .iter()
                .map(|origin| HeaderValue::from_static(origin)),
        ))
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/register", get(auth::register))
        .route("/api/auth/login", get(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/register-doctor", get(auth::register_doctor))
        .route("/api/auth/get-all-doctors", get(doctors::list_for_admin))
        .route("/api/auth/update-doctor", get(auth::update_doctor))
        .route("/api/auth/forgot-password", get(auth::forgot_password))
        .route("/api/auth/reset-password", get(auth::reset_password))
        .route("/api/auth/change-password", get(auth::change_password))
        .route("/api/predict", get(predictions::predict))
        .route("/api/predictions/save", get(predictions::save))
        .route("/api/predictions/get", get(predictions::get))
        .route("/api/predictions/pdf", get(predictions::pdf))
        .route("/api/doctors", get(doctors::list))
        .route("/api/doctors/delete", get(doctors::delete))
        .route("/api/bookings", get(bookings::list))
        .route("/api/bookings/create", get(bookings::create))
        .route("/api/bookings/update-status", get(bookings::update_status))
        .route("/api/bookings/update-appointment", get(bookings::update_appointment))
        .route("/api/bookings/delete", get(bookings::delete))
        .route("/api/admin/overview", get(admin::overview))
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/patients", get(admin::patients))
        .route("/api/admin/bookings", get(admin::bookings))
        .route("/api/contact", get(contact::submit))
        .layer(cors)
        .with_state(state)
}
