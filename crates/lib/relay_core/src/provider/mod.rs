//! Completion provider — the one outbound dependency of the relay.
//!
//! [`CompletionProvider`] is the seam between the HTTP layer and the network:
//! the server uses [`openai::OpenAiClient`], tests substitute a double.

pub mod openai;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::chat::{ProviderRequest, ProviderResponse};

pub use openai::OpenAiClient;

/// Errors from a single outbound completion call.
///
/// The display strings are the messages returned to the relay's caller; the
/// underlying cause is kept as the error source for logging.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to create request body for external API")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to create request to external API")]
    Build(#[source] reqwest::Error),

    #[error("Failed to send request to external API")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to read response from external API")]
    ReadBody {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse response from external API")]
    Parse {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// Short machine-readable class used as a log field.
    pub fn class(&self) -> &'static str {
        match self {
            ProviderError::Encode(_) | ProviderError::Build(_) => "outbound_build_failure",
            ProviderError::Transport(_) | ProviderError::ReadBody { .. } => {
                "outbound_transport_failure"
            }
            ProviderError::Parse { .. } => "outbound_parse_failure",
        }
    }

    /// Upstream HTTP status, when the provider answered at all.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            ProviderError::ReadBody { status, .. } | ProviderError::Parse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Finer classification of network failures for logs.
    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            ProviderError::Transport(e) | ProviderError::ReadBody { source: e, .. } => {
                Some(TransportKind::of(e))
            }
            _ => None,
        }
    }
}

/// What went wrong on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Request,
    Other,
}

impl TransportKind {
    pub fn of(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportKind::Timeout
        } else if error.is_connect() {
            TransportKind::Connect
        } else if error.is_request() || error.is_body() || error.is_decode() {
            TransportKind::Request
        } else {
            TransportKind::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connect => "connect",
            TransportKind::Request => "request",
            TransportKind::Other => "other",
        }
    }
}

/// Something that can answer a completion request.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Performs one completion call. Implementations must not retry.
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error() -> serde_json::Error {
        serde_json::from_str::<ProviderResponse>("not json").unwrap_err()
    }

    #[test]
    fn messages_match_caller_contract() {
        let err = ProviderError::Parse {
            status: StatusCode::OK,
            source: parse_error(),
        };
        assert_eq!(err.to_string(), "Failed to parse response from external API");
        assert_eq!(
            ProviderError::Encode(parse_error()).to_string(),
            "Failed to create request body for external API"
        );
    }

    #[test]
    fn parse_error_carries_upstream_status() {
        let err = ProviderError::Parse {
            status: StatusCode::BAD_GATEWAY,
            source: parse_error(),
        };
        assert_eq!(err.class(), "outbound_parse_failure");
        assert_eq!(err.upstream_status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.transport_kind(), None);
    }

    #[test]
    fn encode_error_is_a_build_failure() {
        let err = ProviderError::Encode(parse_error());
        assert_eq!(err.class(), "outbound_build_failure");
        assert_eq!(err.upstream_status(), None);
    }
}
