use reelq_core::env;
use reelq_core::error::CoreError;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Admission
/// settings (cooldown, allowlist, locator grammar) are loaded separately by
/// [`DispatcherConfig::from_env`](reelq_pipeline::DispatcherConfig::from_env).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite URL of the job store (default: `sqlite://reelq.db`).
    pub database_url: String,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Seconds between rate-limiter evictions (default: `60`).
    pub eviction_interval_secs: u64,
    /// Identities allowed to query statistics.
    pub admin_ids: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default             |
    /// |--------------------------|---------------------|
    /// | `DATABASE_URL`           | `sqlite://reelq.db` |
    /// | `HOST`                   | `0.0.0.0`           |
    /// | `PORT`                   | `3000`              |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                |
    /// | `EVICTION_INTERVAL_SECS` | `60`                |
    /// | `ADMIN_IDS`              | empty               |
    pub fn from_env() -> Result<Self, CoreError> {
        let eviction_interval_secs: u64 = env::parse_or("EVICTION_INTERVAL_SECS", 60)?;
        if eviction_interval_secs == 0 {
            return Err(CoreError::Config(
                "EVICTION_INTERVAL_SECS must be positive".into(),
            ));
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://reelq.db".into()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::parse_or("PORT", 3000)?,
            request_timeout_secs: env::parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            eviction_interval_secs,
            admin_ids: env::list_or("ADMIN_IDS", &[]),
        })
    }
}
