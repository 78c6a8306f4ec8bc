//! Contact-form endpoint: assign a query id and mail a receipt.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::required;
use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::codes;

#[derive(Deserialize)]
pub struct ContactQuery {
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub query_id: String,
}

/// `GET /api/contact`
pub async fn submit(
    State(state): State<AppState>,
    Query(q): Query<ContactQuery>,
) -> Result<Json<ContactResponse>, ApiError> {
    let email = required(&q.email)?;
    let subject = required(&q.subject)?;
    required(&q.message)?;

    let query_id = codes::generate_code();

    // Receipt mail is best-effort; the query id is handed out either way.
    if let Some(mailer) = state.mailer.clone() {
        let to = email.to_string();
        let subject = subject.to_string();
        let id = query_id.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = mailer.send_query_receipt(&to, &subject, &id) {
                tracing::warn!(error = %e, "Could not send query receipt");
            }
        });
    }

    Ok(Json(ContactResponse {
        success: true,
        message: "Query received".into(),
        query_id,
    }))
}
