//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LENDIX_API_URL` - Base URL of the lending REST backend (e.g. `https://api.example.com/api`)
//! - `LENDIX_BASE_URL` - Public URL of this console
//!
//! ## Optional
//! - `LENDIX_HOST` - Bind address (default: 127.0.0.1)
//! - `LENDIX_PORT` - Listen port (default: 3002)
//! - `LENDIX_API_TIMEOUT_SECS` - Per-request backend timeout (default: 15)
//! - `LENDIX_SESSION_HOURS` - Session inactivity expiry (default: 8)
//! - `LENDIX_LOG_JSON` - Emit JSON logs when set to `1`/`true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SESSION_HOURS: i64 = 8;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console application configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the lending backend, without trailing slash
    pub api_url: Url,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the console
    pub base_url: String,
    /// Timeout applied to every backend request
    pub api_timeout: Duration,
    /// Session inactivity expiry in hours
    pub session_hours: i64,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_url = parse_api_url(&env.required("LENDIX_API_URL")?)?;
        let base_url = env
            .required("LENDIX_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let host = env.parsed("LENDIX_HOST", "127.0.0.1".parse::<IpAddr>().ok())?;
        let port = env.parsed("LENDIX_PORT", Some(3002))?;
        let api_timeout = Duration::from_secs(
            env.parsed("LENDIX_API_TIMEOUT_SECS", Some(DEFAULT_API_TIMEOUT_SECS))?,
        );
        let session_hours: i64 = env.parsed("LENDIX_SESSION_HOURS", Some(DEFAULT_SESSION_HOURS))?;
        if session_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "LENDIX_SESSION_HOURS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let log_json = env
            .optional("LENDIX_LOG_JSON")
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"));

        let sentry_sample_rate = env.rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = env.rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            api_url,
            host,
            port,
            base_url,
            api_timeout,
            session_hours,
            log_json,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the console is served over HTTPS (controls `Secure` cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup wrapper with typed accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional, non-blank variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: Option<T>) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
        }
    }

    /// Parse a sample rate in `0.0..=1.0`.
    fn rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate: f32 = self.parsed(key, Some(default))?;
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ))
        }
    }
}

/// Parse the backend URL, requiring an http(s) scheme and stripping any
/// trailing slash so paths can be appended verbatim.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("LENDIX_API_URL".to_string(), reason);

    let url = Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ConsoleConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConsoleConfig::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("LENDIX_API_URL", "https://api.lendix.test/api/"),
        ("LENDIX_BASE_URL", "https://console.lendix.test/"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.lendix.test/api");
        assert_eq!(config.base_url, "https://console.lendix.test");
        assert_eq!(config.port, 3002);
        assert_eq!(config.api_timeout, Duration::from_secs(15));
        assert_eq!(config.session_hours, 8);
        assert!(!config.log_json);
        assert!(config.is_secure());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3002");
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[("LENDIX_BASE_URL", "http://localhost:3002")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("LENDIX_API_URL".to_string()));
    }

    #[test]
    fn test_rejects_non_http_api_url() {
        let err = load(&[
            ("LENDIX_API_URL", "ftp://files.lendix.test"),
            ("LENDIX_BASE_URL", "http://localhost:3002"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "LENDIX_API_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LENDIX_PORT", "not-a-port"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "LENDIX_PORT"
        ));
    }

    #[test]
    fn test_sample_rate_bounds() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SENTRY_SAMPLE_RATE", "1.5"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_zero_session_hours_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LENDIX_SESSION_HOURS", "0"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_log_json_flag() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LENDIX_LOG_JSON", "true"));
        assert!(load(&vars).unwrap().log_json);
    }
}
