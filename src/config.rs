//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::HostelId;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is set but is not a socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    ListenAddr {
        /// Rejected value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// Persistence is enabled but no database URL was given.
    #[error("DATABASE_URL must be set when PERSISTENCE_ENABLED is true")]
    MissingDatabaseUrl,

    /// A `MEMORY_SEED_HOSTELS` entry has a malformed id or an empty name.
    #[error("invalid MEMORY_SEED_HOSTELS entry {value:?}")]
    SeedHostel {
        /// Rejected entry.
        value: String,
    },
}

/// A hostel preloaded into the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedHostel {
    /// Given id, or a fresh one when the entry has none.
    pub id: HostelId,
    /// Display name.
    pub name: String,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. Required when persistence is enabled.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Use PostgreSQL when `true`, the in-memory store otherwise.
    pub persistence_enabled: bool,

    /// Run the monthly insights refresh.
    pub insights_schedule_enabled: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Include internal error details in 5xx responses.
    pub expose_error_details: bool,

    /// Log output format.
    pub log_format: LogFormat,

    /// Hostels loaded into the in-memory store at startup.
    ///
    /// The in-memory store has no other way to learn about hostels, so
    /// without seeds every booking request fails with `404`. Ignored when
    /// persistence is enabled.
    pub memory_seed_hostels: Vec<SeedHostel>,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `LISTEN_ADDR` or `MEMORY_SEED_HOSTELS`
    /// cannot be parsed, or if persistence is enabled without a
    /// `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let listen_addr = raw_addr
            .parse()
            .map_err(|source| ConfigError::ListenAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let persistence_enabled = parse_bool(lookup("PERSISTENCE_ENABLED"), true);
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if persistence_enabled && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let memory_seed_hostels = match lookup("MEMORY_SEED_HOSTELS") {
            Some(raw) => parse_seed_hostels(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_or(lookup("DATABASE_MAX_CONNECTIONS"), 10),
            database_min_connections: parse_or(lookup("DATABASE_MIN_CONNECTIONS"), 2),
            database_connect_timeout_secs: parse_or(lookup("DATABASE_CONNECT_TIMEOUT_SECS"), 5),
            persistence_enabled,
            insights_schedule_enabled: parse_bool(lookup("INSIGHTS_SCHEDULE_ENABLED"), true),
            request_timeout_secs: parse_or(lookup("REQUEST_TIMEOUT_SECS"), 30),
            expose_error_details: parse_bool(lookup("EXPOSE_ERROR_DETAILS"), false),
            log_format,
            memory_seed_hostels,
        })
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connection acquire timeout as a [`Duration`].
    #[must_use]
    pub const fn database_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database_connect_timeout_secs)
    }
}

/// Parses `value` as `T`, returning `default` on missing or invalid values.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}

/// Parses comma-separated `name` or `uuid=name` entries.
fn parse_seed_hostels(raw: &str) -> Result<Vec<SeedHostel>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::SeedHostel {
                value: entry.to_string(),
            };
            let (id, name) = match entry.split_once('=') {
                Some((id, name)) => {
                    let id = Uuid::parse_str(id.trim()).map_err(|_| invalid())?;
                    (HostelId::from_uuid(id), name.trim())
                }
                None => (HostelId::new(), entry),
            };
            if name.is_empty() {
                return Err(invalid());
            }
            Ok(SeedHostel {
                id,
                name: name.to_string(),
            })
        })
        .collect()
}
