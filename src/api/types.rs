//! Shared state for the API layer.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db;
use crate::mail::Mailer;
use crate::otp::OtpStore;
use crate::triage::GroqClient;

/// Shared context for all routes. Each request opens its own short-lived
/// database connection; there is no pooled or cached store state.
#[derive(Clone)]
pub struct AppState {
    pub db_path: PathBuf,
    pub otp: Arc<Mutex<OtpStore>>,
    pub mailer: Option<Arc<Mailer>>,
    pub llm: Option<Arc<GroqClient>>,
}

impl AppState {
    /// Build from the environment: mail and LLM access are optional and
    /// simply absent when unconfigured.
    pub fn from_env(db_path: PathBuf) -> Self {
        let mailer = Mailer::from_env().map(Arc::new);
        if mailer.is_none() {
            tracing::warn!("SMTP not configured, outbound mail disabled");
        }
        let llm = match GroqClient::from_env() {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "LLM not configured, /api/predict degraded");
                None
            }
        };
        Self {
            db_path,
            otp: Arc::new(Mutex::new(OtpStore::new())),
            mailer,
            llm,
        }
    }

    /// State without mail or LLM access, for endpoint tests.
    #[cfg(test)]
    pub(crate) fn for_tests(db_path: PathBuf) -> Self {
        Self {
            db_path,
            otp: Arc::new(Mutex::new(OtpStore::new())),
            mailer: None,
            llm: None,
        }
    }

    /// Open a connection for this request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(ApiError::from)
    }
}
