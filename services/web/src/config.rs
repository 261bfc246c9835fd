//! services/web/src/config.rs
//!
//! Defines the gateway's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use nodo_core::gate::ProtectionPolicy;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the backend API, without a trailing slash.
    pub backend_url: String,
    pub log_level: Level,
    pub protection_policy: ProtectionPolicy,
    pub cookie_secure: bool,
    pub cookie_max_age_days: i64,
    pub event_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Backend ---
        let backend_url = lookup("BACKEND_URL")
            .ok_or_else(|| ConfigError::MissingVar("BACKEND_URL".to_string()))?;
        let backend_url = backend_url.trim().trim_end_matches('/').to_string();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "BACKEND_URL".to_string(),
                format!("'{}' is not an http(s) URL", backend_url),
            ));
        }

        // --- Gate and session cookies ---
        let protection_policy = match lookup("PROTECTED_POLICY") {
            Some(raw) => raw
                .parse::<ProtectionPolicy>()
                .map_err(|e| ConfigError::InvalidValue("PROTECTED_POLICY".to_string(), e))?,
            None => ProtectionPolicy::default(),
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "COOKIE_SECURE".to_string(),
                    format!("'{}' is not a boolean", raw),
                )
            })?,
            None => true,
        };

        let cookie_max_age_days =
            parse_number("COOKIE_MAX_AGE_DAYS", lookup("COOKIE_MAX_AGE_DAYS"), 30)?;
        let event_capacity = parse_number("EVENT_CAPACITY", lookup("EVENT_CAPACITY"), 64)?;

        Ok(Self {
            bind_address,
            backend_url,
            log_level,
            protection_policy,
            cookie_secure,
            cookie_max_age_days,
            event_capacity,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive number", raw),
        )),
    }
}
