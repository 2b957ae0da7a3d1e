//! Credential and endpoint resolution.

use crate::error::{Result, VeoGenError};

/// Environment variables checked for an API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV_VAR: &str = "VEOGEN_BASE_URL";

/// Gemini Developer API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolves the API key: explicit value first, then the environment.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String> {
    resolve_api_key_with(explicit, |name| std::env::var(name).ok())
}

/// Like [`resolve_api_key`] with a custom environment lookup.
///
/// Blank values are treated as absent.
pub fn resolve_api_key_with(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            VeoGenError::Credential(format!(
                "no API key provided. Use --api-key or set {}.",
                API_KEY_ENV_VARS.join(" or ")
            ))
        })
}

/// Resolves the API base URL, without a trailing slash.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(BASE_URL_ENV_VAR).ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}
