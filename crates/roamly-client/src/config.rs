//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts with zero configuration
//! against a local development API.

use std::time::Duration;

use roamly_shared::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_API_BASE, SEARCH_DEBOUNCE_MS, SEARCH_RESULT_LIMIT,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the content API.
    /// Env: `ROAMLY_API_BASE`
    /// Default: `http://127.0.0.1:8000`
    pub api_base: String,

    /// Quiet interval before a user lookup is issued.
    /// Env: `ROAMLY_SEARCH_DEBOUNCE_MS`
    /// Default: `300`
    pub search_debounce: Duration,

    /// Maximum matches requested per lookup.
    /// Env: `ROAMLY_SEARCH_LIMIT`
    /// Default: `5`
    pub search_limit: usize,

    /// TCP/TLS connect timeout for API calls. Requests themselves never
    /// time out.
    /// Env: `ROAMLY_CONNECT_TIMEOUT_SECS`
    /// Default: `10`
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            search_limit: SEARCH_RESULT_LIMIT,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base) = var("ROAMLY_API_BASE") {
            let base = base.trim().trim_end_matches('/');
            if base.is_empty() {
                tracing::warn!("Empty ROAMLY_API_BASE, using default");
            } else {
                config.api_base = base.to_string();
            }
        }

        if let Some(ms) = parse_var::<u64>(&var, "ROAMLY_SEARCH_DEBOUNCE_MS") {
            config.search_debounce = Duration::from_millis(ms);
        }

        if let Some(limit) = parse_var::<usize>(&var, "ROAMLY_SEARCH_LIMIT") {
            if limit == 0 {
                tracing::warn!("ROAMLY_SEARCH_LIMIT must be positive, using default");
            } else {
                config.search_limit = limit;
            }
        }

        if let Some(secs) = parse_var::<u64>(&var, "ROAMLY_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}
