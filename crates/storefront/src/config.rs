//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `KOS_API_BASE` - Backend base URL (default: `https://backend-r5ha.onrender.com`)
//! - `KOS_STORAGE_DIR` - Directory for persisted cart, wishlist and session (default: `.kos`)
//! - `KOS_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime in seconds (default: 300)
//! - `KOS_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 15)
//! - `KOS_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE: &str = "https://backend-r5ha.onrender.com";
const DEFAULT_STORAGE_DIR: &str = ".kos";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "15";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL
    pub api_base: Url,
    /// Directory holding the persisted documents
    pub storage_dir: PathBuf,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Log output format
    pub log_format: LogFormat,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_base = parse_var::<Url>("KOS_API_BASE", &get("KOS_API_BASE", DEFAULT_API_BASE))?;
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "KOS_API_BASE".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let storage_dir = PathBuf::from(get("KOS_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let catalog_cache_ttl = Duration::from_secs(parse_var::<u64>(
            "KOS_CATALOG_CACHE_TTL_SECS",
            &get("KOS_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?);
        let http_timeout = Duration::from_secs(parse_var::<u64>(
            "KOS_HTTP_TIMEOUT_SECS",
            &get("KOS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        )?);
        let log_format =
            parse_var::<LogFormat>("KOS_LOG_FORMAT", &get("KOS_LOG_FORMAT", "pretty"))?;

        Ok(Self {
            api_base,
            storage_dir,
            catalog_cache_ttl,
            http_timeout,
            log_format,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable's value, naming the variable in the error.
fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base.as_str(), "https://backend-r5ha.onrender.com/");
        assert_eq!(config.storage_dir, PathBuf::from(".kos"));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("KOS_API_BASE", "http://localhost:4000"),
            ("KOS_STORAGE_DIR", "/tmp/kos"),
            ("KOS_CATALOG_CACHE_TTL_SECS", "0"),
            ("KOS_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.api_base.as_str(), "http://localhost:4000/");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/kos"));
        assert_eq!(config.catalog_cache_ttl, Duration::ZERO);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_url() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[("KOS_API_BASE", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "KOS_API_BASE"));
    }

    #[test]
    fn test_non_base_url_rejected() {
        let result =
            StorefrontConfig::from_lookup(lookup_from(&[("KOS_API_BASE", "mailto:a@b.c")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[("KOS_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid environment variable KOS_HTTP_TIMEOUT_SECS: invalid digit found in string"
        );
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(
            StorefrontConfig::from_lookup(lookup_from(&[("KOS_LOG_FORMAT", "xml")])).is_err()
        );
    }
}
