//! Environment-driven configuration.
//!
//! Every endpoint and timeout can be overridden with a `COLETA_*` variable,
//! which keeps the CLI pointable at a local registry during development
//! without rebuilding.
//!
//! # Example
//!
//! ```
//! use coleta_types::config::{env_var_or, ColetaConfig};
//!
//! let retries: usize = env_var_or("COLETA_RETRIES", 3);
//! let config = ColetaConfig::from_env();
//! assert!(!config.backend_url.is_empty());
//! ```

use std::str::FromStr;
use std::time::Duration;

use crate::geo::Coordinates;
use crate::retry::RetryConfig;

/// Default registry backend.
pub const DEFAULT_BACKEND_URL: &str = "https://nwl-2020-server.herokuapp.com";

/// Default geographic directory (regions and localities).
pub const DEFAULT_DIRECTORY_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// Default IP-geolocation service.
pub const DEFAULT_GEO_URL: &str = "https://ipapi.co";

/// Map center used when no position can be determined.
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: -23.5682032,
    longitude: -46.7194634,
};

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse an environment variable with a default value.
///
/// Returns the default if the variable is not set or cannot be parsed.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Get an environment variable as a string with a default value.
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Runtime configuration for the registry client and CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct ColetaConfig {
    /// Base URL of the collection-point registry.
    pub backend_url: String,
    /// Base URL of the geographic directory.
    pub directory_url: String,
    /// Base URL of the IP-geolocation service.
    pub geo_url: String,
    /// Overall per-request timeout.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// How long to wait for a position fix before falling back to
    /// [`ColetaConfig::default_center`].
    pub geo_wait: Duration,
    /// Maximum age of a cached position fix.
    pub geo_max_age: Duration,
    /// Fallback map center.
    pub default_center: Coordinates,
    /// Retry policy for directory and registry reads.
    pub retry: RetryConfig,
}

impl ColetaConfig {
    /// Build a configuration from `COLETA_*` environment variables, using
    /// the built-in defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url: env_string_or("COLETA_BACKEND_URL", &defaults.backend_url),
            directory_url: env_string_or("COLETA_DIRECTORY_URL", &defaults.directory_url),
            geo_url: env_string_or("COLETA_GEO_URL", &defaults.geo_url),
            request_timeout: Duration::from_secs(env_var_or(
                "COLETA_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            connect_timeout: Duration::from_secs(env_var_or(
                "COLETA_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )),
            geo_wait: Duration::from_secs(env_var_or(
                "COLETA_GEO_WAIT_SECS",
                defaults.geo_wait.as_secs(),
            )),
            geo_max_age: Duration::from_millis(env_var_or(
                "COLETA_GEO_MAX_AGE_MS",
                defaults.geo_max_age.as_millis() as u64,
            )),
            default_center: env_var("COLETA_DEFAULT_CENTER").unwrap_or(defaults.default_center),
            retry: RetryConfig::new(
                env_var_or("COLETA_RETRIES", defaults.retry.retries),
                env_var_or(
                    "COLETA_RETRY_BACKOFF_MS",
                    defaults.retry.initial_backoff.as_millis() as u64,
                ),
                defaults.retry.max_backoff.as_millis() as u64,
            ),
        }
    }
}

impl Default for ColetaConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            geo_url: DEFAULT_GEO_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            geo_wait: Duration::from_secs(20),
            geo_max_age: Duration::from_millis(1000),
            default_center: DEFAULT_CENTER,
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("COLETA_TEST_U64", "42");
        let val: Option<u64> = env_var("COLETA_TEST_U64");
        assert_eq!(val, Some(42));

        let missing: Option<u64> = env_var("COLETA_TEST_MISSING_12345");
        assert_eq!(missing, None);

        std::env::remove_var("COLETA_TEST_U64");
    }

    #[test]
    fn test_env_var_or_falls_back_on_garbage() {
        std::env::set_var("COLETA_TEST_GARBAGE", "not-a-number");
        let val: u64 = env_var_or("COLETA_TEST_GARBAGE", 7);
        assert_eq!(val, 7);
        std::env::remove_var("COLETA_TEST_GARBAGE");
    }

    #[test]
    fn test_env_string_or() {
        std::env::set_var("COLETA_TEST_STRING", "http://localhost:3333");
        assert_eq!(
            env_string_or("COLETA_TEST_STRING", "default"),
            "http://localhost:3333"
        );
        assert_eq!(env_string_or("COLETA_TEST_MISSING_12346", "default"), "default");
        std::env::remove_var("COLETA_TEST_STRING");
    }

    #[test]
    fn test_default_center_parses_from_env_shape() {
        let parsed: Coordinates = "-23.5682032,-46.7194634".parse().unwrap();
        assert_eq!(parsed, DEFAULT_CENTER);
    }

    #[test]
    fn test_defaults_are_sane() {
        let config = ColetaConfig::default();
        assert_eq!(config.geo_wait, Duration::from_secs(20));
        assert_eq!(config.geo_max_age, Duration::from_millis(1000));
        assert!(config.backend_url.starts_with("https://"));
    }
}
