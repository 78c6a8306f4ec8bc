use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Ayurix";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    "ayurix_server=info,tower_http=warn".to_string()
}

/// Get the application data directory
/// ~/Ayurix/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("Ayurix"),
        None => PathBuf::from("."),
    }
}

/// Database path: AYURIX_DB env override, else ~/Ayurix/ayurix.db
pub fn db_path() -> PathBuf {
    match std::env::var("AYURIX_DB") {
        Ok(path) => PathBuf::from(path),
        Err(_) => app_data_dir().join("ayurix.db"),
    }
}

/// Listen address: PORT env override, else 5000 (legacy default)
pub fn bind_addr() -> SocketAddr {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Browser origins allowed to call the API
pub fn allowed_origins() -> [&'static str; 3] {
    [
        "https://ayurix.vercel.app",
        "http://localhost:5173",
        "http://localhost:3000",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_ayurix() {
        assert!(app_data_dir().ends_with("Ayurix"));
    }

    #[test]
    fn default_port_is_5000() {
        // PORT is unset in the test environment
        if std::env::var("PORT").is_err() {
            assert_eq!(bind_addr().port(), 5000);
        }
    }

    #[test]
    fn app_name_is_ayurix() {
        assert_eq!(APP_NAME, "Ayurix");
    }
}
