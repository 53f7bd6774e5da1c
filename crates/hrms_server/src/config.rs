//! Environment-driven server configuration.
//!
//! # Invariants
//! - Every variable has a default; only malformed values fail.
//! - Lookups go through one function so tests never touch process env.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "HRMS_BIND_ADDR";
pub const ENV_DATABASE_PATH: &str = "HRMS_DATABASE_PATH";
pub const ENV_APP_NAME: &str = "HRMS_APP_NAME";
pub const ENV_DEBUG: &str = "HRMS_DEBUG";
pub const ENV_ALLOWED_ORIGINS: &str = "HRMS_ALLOWED_ORIGINS";
pub const ENV_LOG_LEVEL: &str = "HRMS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HRMS_LOG_DIR";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DATABASE_PATH: &str = "hrms.sqlite3";
const DEFAULT_APP_NAME: &str = "HRMS Lite API";
const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

/// Origins allowed by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseLocation,
    pub app_name: String,
    /// Exposes internal error text in 500 responses.
    pub debug: bool,
    pub allowed_origins: AllowedOrigins,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<String>,
}

impl ServerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_raw = read(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|err| ConfigError::InvalidValue {
            key: ENV_BIND_ADDR,
            value: bind_raw.clone(),
            reason: err.to_string(),
        })?;

        let database = match read(ENV_DATABASE_PATH).as_deref() {
            Some(IN_MEMORY_DATABASE) => DatabaseLocation::Memory,
            Some(path) => DatabaseLocation::File(PathBuf::from(path)),
            None => DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)),
        };

        let debug = match read(ENV_DEBUG) {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_DEBUG,
                value: raw.clone(),
                reason: "expected true|false|1|0|yes|no".to_string(),
            })?,
        };

        let allowed_origins = match read(ENV_ALLOWED_ORIGINS) {
            None => AllowedOrigins::Any,
            Some(raw) => parse_origins(&raw)?,
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            None => hrms_core::default_log_level().to_string(),
            Some(raw) => hrms_core::parse_log_level(&raw)
                .map(str::to_string)
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: raw.clone(),
                    reason: err.to_string(),
                })?,
        };

        let log_dir = match read(ENV_LOG_DIR) {
            Some(dir) if !std::path::Path::new(&dir).is_absolute() => {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir,
                    reason: "must be an absolute path".to_string(),
                });
            }
            other => other,
        };

        Ok(Self {
            bind_addr,
            database,
            app_name: read(ENV_APP_NAME).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            debug,
            allowed_origins,
            log_level,
            log_dir,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_origins(raw: &str) -> Result<AllowedOrigins, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|origin| origin == "*") {
        return Ok(AllowedOrigins::Any);
    }
    if let Some(bad) = origins
        .iter()
        .find(|origin| axum::http::HeaderValue::from_str(origin).is_err())
    {
        return Err(ConfigError::InvalidValue {
            key: ENV_ALLOWED_ORIGINS,
            value: bad.clone(),
            reason: "not a valid header value".to_string(),
        });
    }
    if origins.is_empty() {
        return Ok(AllowedOrigins::Any);
    }
    Ok(AllowedOrigins::List(origins))
}
