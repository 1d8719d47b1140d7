//! Relay configuration.
//!
//! Resolved once at process start by the server binary's command line (each
//! flag falls back to an environment variable) and checked with
//! [`RelayConfig::validate`]. The provider credential has no default: a
//! missing or empty `OPENAI_API_KEY` is a startup error.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Default provider endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default outbound request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Default inbound body limit (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Configuration for the relay.
#[derive(Clone)]
pub struct RelayConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8080").
    pub bind_addr: String,
    /// Bearer credential for the provider.
    pub api_key: String,
    /// Provider chat-completions endpoint.
    pub upstream_url: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Deadline for one outbound call, connect through body read.
    pub request_timeout: Duration,
    /// Maximum accepted inbound body size.
    pub max_body_bytes: usize,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &"<redacted>")
            .field("upstream_url", &self.upstream_url)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl RelayConfig {
    /// Config with defaults for everything but the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_key: api_key.into(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Checks invariants that cannot be expressed in the field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("OPENAI_API_KEY"));
        }

        let url: Url = self
            .upstream_url
            .parse()
            .map_err(|e: url::ParseError| ConfigError::Invalid {
                name: "RELAY_UPSTREAM_URL",
                reason: e.to_string(),
            })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "RELAY_UPSTREAM_URL",
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "RELAY_MODEL",
                reason: "must not be empty".into(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "RELAY_REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults_around_the_key() {
        let config = RelayConfig::new("sk-test");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn empty_or_blank_key_fails() {
        for key in ["", "   "] {
            let err = RelayConfig::new(key).validate().unwrap_err();
            assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
            assert_eq!(err.to_string(), "OPENAI_API_KEY is required");
        }
    }

    #[test]
    fn overrides_pass_validation() {
        let mut config = RelayConfig::new("sk-test");
        config.bind_addr = "127.0.0.1:9000".into();
        config.upstream_url = "http://localhost:4000/v1/chat/completions".into();
        config.model = "gpt-4o".into();
        config.request_timeout = Duration::from_secs(5);
        config.max_body_bytes = 1024;
        config.validate().expect("valid overrides");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = RelayConfig::new("sk-test");
        config.request_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "RELAY_REQUEST_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn blank_model_is_rejected() {
        let mut config = RelayConfig::new("sk-test");
        config.model = " ".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid {
                name: "RELAY_MODEL",
                ..
            }
        ));
    }

    #[test]
    fn non_http_upstream_is_rejected() {
        let mut config = RelayConfig::new("sk-test");
        config.upstream_url = "ftp://example.com/chat".into();
        assert!(config.validate().is_err());

        config.upstream_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = RelayConfig::new("sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
