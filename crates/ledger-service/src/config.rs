//! Service configuration.

use std::path::Path;

use ledger_core::LedgerPolicy;
use ledger_store::postgres::DEFAULT_LOCK_TIMEOUT_MS;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The policy file could not be read.
    #[error("failed to read policy file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The policy file is not valid JSON for a policy.
    #[error("failed to parse policy file {path}: {source}")]
    Parse {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The policy parsed but its values are unusable.
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string. Absent means the in-memory store.
    pub database_url: Option<String>,

    /// Connection pool size (default: 10).
    pub database_max_connections: u32,

    /// How long a unit of work waits for a row lock, in milliseconds.
    pub lock_timeout_ms: u64,

    /// HS256 secret for employee and customer tokens.
    pub jwt_secret: String,

    /// Service API key for the nightly job endpoint.
    pub service_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// File the nightly run log is appended to.
    pub nightly_log_path: Option<String>,

    /// JSON policy file (`LEDGER_POLICY_FILE`).
    pub policy_file: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            lock_timeout_ms: parse_env("LOCK_TIMEOUT_MS").unwrap_or(defaults.lock_timeout_ms),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("JWT_SECRET not set - using insecure development secret");
                defaults.jwt_secret
            }),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: parse_env("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            nightly_log_path: std::env::var("NIGHTLY_LOG_PATH").ok(),
            policy_file: std::env::var("LEDGER_POLICY_FILE").ok(),
        }
    }

    /// Load the ledger policy from `policy_file`, or the defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting policy fails validation.
    pub fn load_policy(&self) -> Result<LedgerPolicy, ConfigError> {
        let policy = match &self.policy_file {
            Some(path) => {
                let policy = load_policy_file(Path::new(path))?;
                tracing::info!(path = %path, "Loaded ledger policy from file");
                policy
            }
            None => LedgerPolicy::default(),
        };

        policy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(policy)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Read a policy from a JSON file. Missing keys take their default values.
fn load_policy_file(path: &Path) -> Result<LedgerPolicy, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            database_max_connections: 10,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            jwt_secret: "ledger-dev-secret".into(),
            service_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            nightly_log_path: None,
            policy_file: None,
        }
    }
}
