//! Configuration module for environment variable parsing.
//!
//! Configuration is loaded once at startup and never mutated afterwards.
//! Missing required values are fatal: the server must not start without a
//! downstream URL and credential to forward with.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default port when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 3000;

/// Default timeout for the downstream forward call.
pub const DEFAULT_FORWARD_TIMEOUT_MS: u64 = 30_000;

/// Startup configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the downstream application
    pub main_app_url: String,

    /// Bearer credential sent with every forward call
    pub main_app_api_key: String,

    /// Verbose request/response logging and unredacted error messages
    pub debug: bool,

    /// Port for the web server to listen on
    pub port: u16,

    /// Timeout applied to the forward call
    pub forward_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let main_app_url = required(&lookup, "MAIN_APP_URL")?;
        let main_app_api_key = required(&lookup, "MAIN_APP_API_KEY")?;

        Ok(Config {
            main_app_url,
            main_app_api_key,

            debug: lookup("DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),

            port: parse_or(&lookup, "PORT", DEFAULT_PORT),

            forward_timeout: Duration::from_millis(parse_or(
                &lookup,
                "FORWARD_TIMEOUT_MS",
                DEFAULT_FORWARD_TIMEOUT_MS,
            )),
        })
    }

    /// Full URL of the downstream webhook ingestion endpoint.
    pub fn forward_endpoint(&self) -> String {
        format!(
            "{}/api/twilio/webhook",
            self.main_app_url.trim_end_matches('/')
        )
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Interpret a boolean-ish environment value.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
