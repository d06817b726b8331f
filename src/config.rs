//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct,
//! then validates the values that the gateway cannot start without.

use std::time::Duration;

use axum::http::HeaderName;
use serde::Deserialize;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variables could not be deserialized.
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    /// A value was present but unusable.
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 4000
/// - `GRAPHQL_PATH` (optional): path the GraphQL endpoint is mounted on, defaults to `/graphql`
/// - `API_KEY_HEADER` (optional): header carrying the caller's key, defaults to `x-unkey-api-key`
/// - `UNKEY_API_URL` (optional): base URL of the verification authority
/// - `UNKEY_ROOT_KEY` (optional): root key used to authenticate against the authority
/// - `UNKEY_API_ID` (optional): API the verified keys must belong to
/// - `VERIFY_TIMEOUT_MS` (optional): upper bound for one verification call, defaults to 5000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    #[serde(default = "default_unkey_api_url")]
    pub unkey_api_url: String,

    #[serde(default)]
    pub unkey_root_key: Option<String>,

    #[serde(default)]
    pub unkey_api_id: Option<String>,

    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
}

fn default_port() -> u16 {
    4000
}

fn default_graphql_path() -> String {
    "/graphql".to_string()
}

fn default_api_key_header() -> String {
    crate::middleware::credential::API_KEY_HEADER.to_string()
}

fn default_unkey_api_url() -> String {
    "https://api.unkey.dev".to_string()
}

fn default_verify_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - A value fails validation (see [`Config::validate`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: graphql_path -> GRAPHQL_PATH
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would otherwise fail at the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.graphql_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "GRAPHQL_PATH",
                reason: "must start with '/'".to_string(),
            });
        }
        if self.graphql_path == crate::app::HEALTH_PATH {
            return Err(ConfigError::Invalid {
                field: "GRAPHQL_PATH",
                reason: format!("{} is reserved for the health check", crate::app::HEALTH_PATH),
            });
        }
        // The router would read these as captures or wildcards
        if self.graphql_path.contains(['{', '}', '*'])
            || self.graphql_path.split('/').any(|segment| segment.starts_with(':'))
        {
            return Err(ConfigError::Invalid {
                field: "GRAPHQL_PATH",
                reason: "must be a literal path without '{', '}', '*' or ':' segments".to_string(),
            });
        }

        self.header_name()?;

        let parsed = url::Url::parse(&self.unkey_api_url).map_err(|e| ConfigError::Invalid {
            field: "UNKEY_API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "UNKEY_API_URL",
                reason: "URL must use HTTP or HTTPS".to_string(),
            });
        }

        if self.verify_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "VERIFY_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// The credential header as a parsed, lower-cased header name.
    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.api_key_header.as_str()).map_err(|e| ConfigError::Invalid {
            field: "API_KEY_HEADER",
            reason: e.to_string(),
        })
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            server_port: default_port(),
            graphql_path: default_graphql_path(),
            api_key_header: default_api_key_header(),
            unkey_api_url: default_unkey_api_url(),
            unkey_root_key: None,
            unkey_api_id: None,
            verify_timeout_ms: default_verify_timeout_ms(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = base();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.header_name().unwrap().as_str(), "x-unkey-api-key");
        assert_eq!(config.verify_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn path_without_leading_slash_is_rejected() {
        let config = Config {
            graphql_path: "graphql".to_string(),
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "GRAPHQL_PATH", .. })
        ));
    }

    #[test]
    fn path_colliding_with_routes_is_rejected() {
        for path in ["/health", "/graphql/{id}", "/graphql/*rest", "/api/:version"] {
            let config = Config {
                graphql_path: path.to_string(),
                ..base()
            };
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::Invalid { field: "GRAPHQL_PATH", .. })
                ),
                "{path} should be rejected"
            );
        }

        let config = Config {
            graphql_path: "/api/graphql".to_string(),
            ..base()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_header_and_url_are_rejected() {
        let config = Config {
            api_key_header: "not a header".to_string(),
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "API_KEY_HEADER", .. })
        ));

        let config = Config {
            unkey_api_url: "ftp://api.unkey.dev".to_string(),
            ..base()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "UNKEY_API_URL", .. })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            verify_timeout_ms: 0,
            ..base()
        };
        assert!(config.validate().is_err());
    }
}
