//! Ayurix backend: appointment booking, LLM symptom triage and the
//! legacy-compatible prediction store, served over a GET-only JSON API.

pub mod api;
pub mod codes;
pub mod config;
pub mod db;
pub mod mail;
pub mod models;
pub mod otp;
pub mod prediction;
pub mod report;
pub mod triage;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. RUST_LOG overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Start the server: prepare the database, build state from the
/// environment and serve until shutdown.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!("{} v{} starting", config::APP_NAME, config::APP_VERSION);

    let db_path = config::db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Open once up front so migrations run before the first request
    let conn = db::open_database(&db_path)?;
    tracing::info!(
        path = %db_path.display(),
        tables = db::count_tables(&conn)?,
        "Database ready"
    );
    drop(conn);

    let state = api::AppState::from_env(db_path);
    let app = api::api_router(state);

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
