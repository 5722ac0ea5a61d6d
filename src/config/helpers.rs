use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;

/// Read an env var, treating empty values as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!("failed to read {key}: {e}"))),
    }
}

/// Parse an optional env var, falling back to `fallback` when unset.
pub(crate) fn parse_env_or<T>(key: &str, fallback: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(key)?
        .map(|raw| raw.parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse value: {e}"),
        })
        .map(|parsed| parsed.unwrap_or(fallback))
}

/// Validate an http(s) base URL and strip any trailing slash.
pub(crate) fn validate_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("URL parse failed: {e}"),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("scheme '{}' is not allowed (allowed: http, https)", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "URL is missing host".to_string(),
        });
    }

    Ok(trimmed.to_string())
}
