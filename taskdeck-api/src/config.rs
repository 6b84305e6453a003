//! API Configuration Module
//!
//! Server address, CORS, logging and store selection, loaded from
//! environment variables with defaults suitable for local runs.

use std::net::SocketAddr;

use taskdeck_core::{ConfigError, TASKS_TABLE, USERS_TABLE};

use crate::constants::{DEFAULT_BIND_HOST, DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_PORT};

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Environment variables:
    /// - `TASKDECK_API_BIND`: Host or IP to bind (default: 0.0.0.0)
    /// - `PORT`: Port to listen on (default: 3000)
    pub fn from_env() -> Self {
        let bind_host = std::env::var("TASKDECK_API_BIND")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { bind_host, port }
    }

    /// Resolve the socket address to bind.
    pub fn resolve_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.bind_host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "TASKDECK_API_BIND".to_string(),
            value: raw,
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Cross-origin settings for browser clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// Environment variables:
    /// - `TASKDECK_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TASKDECK_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("TASKDECK_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("TASKDECK_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        Self {
            cors_origins,
            cors_max_age_secs,
        }
    }

    /// Whether any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    ///
    /// Entries of the form `*.example.com` match any https subdomain.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.allows_any_origin() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            match (allowed.strip_prefix("*."), origin.strip_prefix("https://")) {
                (Some(domain), Some(origin_host)) => origin_host
                    .strip_suffix(domain)
                    .is_some_and(|sub| sub.ends_with('.') && sub.len() > 1),
                _ => false,
            }
        })
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl LogConfig {
    /// `TASKDECK_LOG_FORMAT`: `json` or `pretty` (default). The filter itself
    /// comes from `RUST_LOG`.
    pub fn from_env() -> Self {
        let format = match std::env::var("TASKDECK_LOG_FORMAT")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        Self { format }
    }
}

// ============================================================================
// STORE CONFIGURATION
// ============================================================================

/// Which store client backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Dynamo,
    /// Process-local tables; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dynamo" | "dynamodb" => Ok(StoreBackend::Dynamo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "TASKDECK_STORE".to_string(),
                value: other.to_string(),
                reason: "expected 'dynamo' or 'memory'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub tasks_table: String,
    pub users_table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            tasks_table: TASKS_TABLE.to_string(),
            users_table: USERS_TABLE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Environment variables:
    /// - `TASKDECK_STORE`: `dynamo` (default) or `memory`
    /// - `TASKDECK_TASKS_TABLE`: Task table name (default: Tasks)
    /// - `TASKDECK_USERS_TABLE`: User table name (default: Users)
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("TASKDECK_STORE") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::default(),
        };
        let table = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            backend,
            tasks_table: table("TASKDECK_TASKS_TABLE", TASKS_TABLE),
            users_table: table("TASKDECK_USERS_TABLE", USERS_TABLE),
        })
    }
}
