use std::env;

/// Server configuration loaded from environment variables.
///
/// Identity-provider settings live in [`signup_auth::AuthConfig`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of browser tabs kept in tab storage (default: 10,000)
    pub tab_storage_capacity: usize,
    /// Path to SQLite database file (default: "signup.db")
    #[cfg(feature = "sqlite")]
    pub sqlite_path: String,
    /// Port of the development IdP (default: 3001)
    #[cfg(feature = "mock")]
    pub mock_idp_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TAB_STORAGE_CAPACITY` - Tabs kept before the least recent is evicted (default: 10,000)
    /// - `SQLITE_PATH` - SQLite database path, `sqlite` feature only (default: "signup.db")
    /// - `MOCK_IDP_PORT` - Development IdP port, `mock` feature only (default: 3001)
    pub fn from_env() -> Self {
        Self {
            tab_storage_capacity: env::var("TAB_STORAGE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v: &usize| v > 0)
                .unwrap_or(10_000),
            #[cfg(feature = "sqlite")]
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "signup.db".to_string()),
            #[cfg(feature = "mock")]
            mock_idp_port: env::var("MOCK_IDP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
