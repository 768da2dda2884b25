//! Environment-driven configuration.
//!
//! Loaded once at startup, after `dotenvy` has populated the environment
//! from any `.env` file. The dwell threshold keeps its original variable
//! name (`TIEMPO_MAXIMO_DENTRO`) so existing deployments carry over.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Default exceeded-duration threshold: one hour inside.
pub const DEFAULT_MAX_DWELL_SECONDS: i64 = 3600;

const DEFAULT_POOL_SIZE: usize = 8;

/// Connection settings for the event store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    url: SecretString,
    pub pool_size: usize,
}

impl DatabaseConfig {
    /// Expose the connection URL (contains the credential).
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Seconds inside after which an entry counts as exceeded (strict `>`).
    pub max_dwell_seconds: i64,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        let pool_size = env_or("DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        let max_dwell_seconds = env_or("TIEMPO_MAXIMO_DENTRO", DEFAULT_MAX_DWELL_SECONDS)?;

        Ok(Self {
            database: DatabaseConfig {
                url: url.into(),
                pool_size,
            },
            max_dwell_seconds,
        })
    }
}

fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_or_default(var, std::env::var(var).ok(), default)
}

/// Parse an optional raw value, falling back to the default only when the
/// variable is absent. A present but malformed value is a startup error,
/// never a silent default.
fn parse_or_default<T>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
