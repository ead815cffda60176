// src/utils.rs

use std::env;

/// Reads an environment variable, returning an empty string when it is unset.
pub fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

/// Returns the URL from `key` in `lookup` if present, otherwise `default`.
///
/// Trailing slashes are stripped so callers can append path segments with `/`.
pub fn resolve_url(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}
