// src/config.rs

use std::time::Duration;

use thiserror::Error;

use crate::utils::{get_env, resolve_url};

// ============================================================================
// Provider Constants
// ============================================================================

pub const SEARCH_URL: &str = "https://api.tomtom.com/search/2/search";
pub const ROUTING_URL: &str = "https://api.tomtom.com/routing/1/calculateRoute";

pub const API_KEY_VAR: &str = "API_KEY";
pub const SEARCH_URL_VAR: &str = "TOMTOM_SEARCH_URL";
pub const ROUTING_URL_VAR: &str = "TOMTOM_ROUTING_URL";
pub const TIMEOUT_VAR: &str = "COMMUTE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key not provided in .env file")]
    MissingApiKey,
}

/// Provider credential, endpoints and request timeout. Read-only once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub search_url: String,
    pub routing_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("search_url", &self.search_url)
            .field("routing_url", &self.routing_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            search_url: SEARCH_URL.to_string(),
            routing_url: ROUTING_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builds the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if `.env` values should be visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| Some(get_env(key)).filter(|v| !v.is_empty()))
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "Invalid {TIMEOUT_VAR}, using {DEFAULT_TIMEOUT_SECS}s"
                    );
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            search_url: resolve_url(&lookup, SEARCH_URL_VAR, SEARCH_URL),
            routing_url: resolve_url(&lookup, ROUTING_URL_VAR, ROUTING_URL),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Points both endpoints at `base`, e.g. a local fixture server.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.search_url = format!("{base}/search/2/search");
        self.routing_url = format!("{base}/routing/1/calculateRoute");
        self
    }
}
