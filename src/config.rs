use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::{self, AuthError};

pub const ENV_API_KEY_ID: &str = "VERACODE_API_KEY_ID";
pub const ENV_API_KEY_SECRET: &str = "VERACODE_API_KEY_SECRET";
pub const DEFAULT_BASE_URL: &str = "https://api.veracode.com";

/// Startup configuration problems, distinct from runtime API failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0} does not hold a usable API key secret: {1}")]
    InvalidSecret(&'static str, #[source] AuthError),
}

/// Run parameters resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_id: String,
    pub api_secret: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl Config {
    /// Read credentials from the environment and resolve the base URL.
    ///
    /// `base_url_override` (CLI flag or `VERACODE_API_BASE_URL`) wins over
    /// the public production endpoint. The secret's hex payload is checked
    /// here so a malformed credential fails before any request is sent.
    pub fn from_env(
        base_url_override: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_id = require_env(ENV_API_KEY_ID)?;
        let api_secret = require_env(ENV_API_KEY_SECRET)?;
        auth::decode_secret(&api_secret)
            .map_err(|e| ConfigError::InvalidSecret(ENV_API_KEY_SECRET, e))?;

        let raw = base_url_override.unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })?;

        Ok(Self {
            api_id,
            api_secret,
            base_url,
            timeout,
        })
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers the whole env sequence; the process environment is
    // shared across threads, so split tests would race on these variables.
    #[test]
    fn from_env_requires_both_credentials_then_succeeds() {
        env::remove_var(ENV_API_KEY_ID);
        env::remove_var(ENV_API_KEY_SECRET);
        let err = Config::from_env(None, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ENV_API_KEY_ID)));

        env::set_var(ENV_API_KEY_ID, "0123abcd");
        let err = Config::from_env(None, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential(ENV_API_KEY_SECRET)
        ));

        env::set_var(ENV_API_KEY_SECRET, "zzzz");
        let err = Config::from_env(None, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSecret(_, _)));

        env::set_var(ENV_API_KEY_SECRET, "deadbeefcafebabe");
        let config = Config::from_env(None, Duration::from_secs(30)).unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.veracode.com/");
        assert_eq!(config.api_id, "0123abcd");

        let config =
            Config::from_env(Some("http://127.0.0.1:9000"), Duration::from_secs(5)).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000/");

        let err = Config::from_env(Some("not a url"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        env::remove_var(ENV_API_KEY_ID);
        env::remove_var(ENV_API_KEY_SECRET);
    }
}
