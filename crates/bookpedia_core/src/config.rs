//! Runtime configuration for the core.
//!
//! # Responsibility
//! - Hold the endpoints, timeouts and timing windows used across layers.
//! - Read `BOOKPEDIA_*` environment overrides on top of built-in defaults.
//!
//! # Invariants
//! - Defaults reproduce the production client behavior (20 s remote timeout,
//!   500 ms search debounce, 5 s state grace window).
//! - An override that cannot be parsed is an error, never silently ignored.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://openlibrary.org";
pub const DEFAULT_COVERS_BASE_URL: &str = "https://covers.openlibrary.org";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_STATE_GRACE_WINDOW: Duration = Duration::from_secs(5);
pub const DEFAULT_DB_FILE_NAME: &str = "book.db";

const ENV_API_BASE_URL: &str = "BOOKPEDIA_API_BASE_URL";
const ENV_COVERS_BASE_URL: &str = "BOOKPEDIA_COVERS_BASE_URL";
const ENV_REQUEST_TIMEOUT_MS: &str = "BOOKPEDIA_REQUEST_TIMEOUT_MS";
const ENV_SEARCH_LIMIT: &str = "BOOKPEDIA_SEARCH_LIMIT";
const ENV_SEARCH_DEBOUNCE_MS: &str = "BOOKPEDIA_SEARCH_DEBOUNCE_MS";
const ENV_GRACE_WINDOW_MS: &str = "BOOKPEDIA_GRACE_WINDOW_MS";
const ENV_DB_FILE: &str = "BOOKPEDIA_DB_FILE";

/// Configuration error naming the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Full core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the book search API, without trailing slash.
    pub api_base_url: String,
    /// Base URL of the cover image service, without trailing slash.
    pub covers_base_url: String,
    pub request_timeout: Duration,
    /// Result limit sent with every search request.
    pub search_limit: u32,
    pub db_file_name: String,
    pub controller: ControllerConfig,
}

/// Timing windows used by view-state controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Quiet period required before a query change triggers a search.
    pub search_debounce: Duration,
    /// How long controller state stays active after its last observer leaves.
    pub state_grace_window: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            state_grace_window: DEFAULT_STATE_GRACE_WINDOW,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            covers_base_url: DEFAULT_COVERS_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            db_file_name: DEFAULT_DB_FILE_NAME.to_string(),
            controller: ControllerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Keys that are absent or blank keep their default value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_API_BASE_URL) {
            config.api_base_url = parse_base_url(ENV_API_BASE_URL, value)?;
        }
        if let Some(value) = read(ENV_COVERS_BASE_URL) {
            config.covers_base_url = parse_base_url(ENV_COVERS_BASE_URL, value)?;
        }
        if let Some(value) = read(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = parse_millis(ENV_REQUEST_TIMEOUT_MS, value)?;
        }
        if let Some(value) = read(ENV_SEARCH_LIMIT) {
            config.search_limit = parse_positive(ENV_SEARCH_LIMIT, value)?;
        }
        if let Some(value) = read(ENV_SEARCH_DEBOUNCE_MS) {
            config.controller.search_debounce = parse_millis(ENV_SEARCH_DEBOUNCE_MS, value)?;
        }
        if let Some(value) = read(ENV_GRACE_WINDOW_MS) {
            config.controller.state_grace_window = parse_millis(ENV_GRACE_WINDOW_MS, value)?;
        }
        if let Some(value) = read(ENV_DB_FILE) {
            config.db_file_name = value;
        }

        Ok(config)
    }
}

fn parse_base_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected an http:// or https:// URL",
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_millis(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    parse_positive(key, value).map(|millis| Duration::from_millis(u64::from(millis)))
}

fn parse_positive(key: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "must be greater than zero",
        }),
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected a positive integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DEFAULT_REQUEST_TIMEOUT};
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.controller.search_debounce, Duration::from_millis(500));
        assert_eq!(config.controller.state_grace_window, Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_applied_and_trailing_slash_trimmed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("BOOKPEDIA_API_BASE_URL", "http://127.0.0.1:8080/"),
            ("BOOKPEDIA_REQUEST_TIMEOUT_MS", "1500"),
            ("BOOKPEDIA_SEARCH_LIMIT", "5"),
            ("BOOKPEDIA_DB_FILE", " favorites.db "),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.db_file_name, "favorites.db");
    }

    #[test]
    fn invalid_override_names_the_key() {
        let err = AppConfig::from_lookup(lookup_from(&[("BOOKPEDIA_SEARCH_DEBOUNCE_MS", "soon")]))
            .unwrap_err();
        let ConfigError::InvalidValue { key, .. } = &err;
        assert_eq!(*key, "BOOKPEDIA_SEARCH_DEBOUNCE_MS");
        assert!(err.to_string().contains("soon"));

        let err = AppConfig::from_lookup(lookup_from(&[("BOOKPEDIA_SEARCH_LIMIT", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err = AppConfig::from_lookup(lookup_from(&[("BOOKPEDIA_API_BASE_URL", "ftp://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("BOOKPEDIA_API_BASE_URL"));
    }
}
