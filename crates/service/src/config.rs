//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target a local development stack.
//!
//! ## Database
//! - `DATABASE_URL` - Full `PostgreSQL` connection string (overrides the parts below)
//! - `DB_HOST` - Database host (default: 127.0.0.1)
//! - `DB_PORT` - Database port (default: 5433)
//! - `DB_USER` - Database user (default: postgres)
//! - `DB_PASSWORD` - Database password (default: 121212)
//! - `DB_NAME` - Database name (default: `orders_db`)
//!
//! ## Message bus
//! - `NATS_URL` - NATS server URL (default: <nats://localhost:4222>)
//! - `NATS_CLIENT_ID` - Connection name (default: order-service-sub)
//! - `NATS_STREAM` - `JetStream` stream holding the orders subject (default: ORDERS)
//! - `NATS_SUBJECT` - Orders subject (default: orders)
//! - `NATS_DURABLE` - Durable consumer name (default: order-service-durable)
//!
//! ## HTTP
//! - `SERVER_HOST` - Bind address (default: 0.0.0.0)
//! - `SERVER_PORT` - Listen port (default: 8080)
//! - `STATIC_DIR` - Static asset directory (default: web)
//! - `HTTP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `SHUTDOWN_GRACE_SECS` - Grace period for in-flight requests (default: 5)
//!
//! ## Cache
//! - `CACHE_CAPACITY` - Maximum number of cached orders (default: 100, must be >= 1)
//!
//! ## Observability
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `text` or `json` (default: text)

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Order service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` connection settings
    pub database: DatabaseConfig,
    /// NATS `JetStream` settings
    pub nats: NatsConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory served as the static fallback
    pub static_dir: PathBuf,
    /// Upper bound on a single HTTP request
    pub request_timeout: Duration,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace: Duration,
    /// Bounded cache capacity
    pub cache_capacity: NonZeroUsize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

/// `PostgreSQL` connection settings.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the individual parts
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// NATS `JetStream` settings.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    /// Connection name reported to the server
    pub client_id: String,
    pub stream: String,
    pub subject: String,
    /// Durable consumer name; delivery resumes from it after a restart
    pub durable: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database = DatabaseConfig {
            url: env.optional("DATABASE_URL").map(SecretString::from),
            host: env.or_default("DB_HOST", "127.0.0.1"),
            port: env.parse("DB_PORT", "5433")?,
            user: env.or_default("DB_USER", "postgres"),
            password: SecretString::from(env.or_default("DB_PASSWORD", "121212")),
            name: env.or_default("DB_NAME", "orders_db"),
        };

        let nats = NatsConfig {
            url: env.or_default("NATS_URL", "nats://localhost:4222"),
            client_id: env.or_default("NATS_CLIENT_ID", "order-service-sub"),
            stream: env.or_default("NATS_STREAM", "ORDERS"),
            subject: env.or_default("NATS_SUBJECT", "orders"),
            durable: env.or_default("NATS_DURABLE", "order-service-durable"),
        };

        let cache_capacity = env
            .parse::<usize>("CACHE_CAPACITY", "100")
            .and_then(|n| {
                NonZeroUsize::new(n).ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "CACHE_CAPACITY".to_string(),
                        "must be at least 1".to_string(),
                    )
                })
            })?;

        let json_logs = match env.or_default("LOG_FORMAT", "text").as_str() {
            "json" => true,
            "text" => false,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected `text` or `json`, got `{other}`"),
                ));
            }
        };

        Ok(Self {
            database,
            nats,
            host: env.parse("SERVER_HOST", "0.0.0.0")?,
            port: env.parse("SERVER_PORT", "8080")?,
            static_dir: PathBuf::from(env.or_default("STATIC_DIR", "web")),
            request_timeout: Duration::from_secs(env.parse("HTTP_REQUEST_TIMEOUT_SECS", "15")?),
            shutdown_grace: Duration::from_secs(env.parse("SHUTDOWN_GRACE_SECS", "5")?),
            cache_capacity,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            json_logs,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default) into `T`.
    fn parse<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
