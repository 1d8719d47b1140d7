//! Application error types.
//!
//! Every failure is terminal for the request and answers with a plain-text
//! body; the status and message per variant are part of the public contract.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use relay_core::provider::ProviderError;
use thiserror::Error;
use tracing::{error, warn};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request method. Use POST.")]
    InvalidMethod(Method),

    #[error("Failed to read request body")]
    UnreadableBody(#[source] axum::Error),

    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error("No response content from external API")]
    EmptyUpstreamResult,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UnreadableBody(_) | AppError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::EmptyUpstreamResult => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable class used as a log field.
    pub fn class(&self) -> &'static str {
        match self {
            AppError::InvalidMethod(_) => "invalid_method",
            AppError::UnreadableBody(_) | AppError::InvalidJson(_) => "malformed_inbound_body",
            AppError::Upstream(e) => e.class(),
            AppError::EmptyUpstreamResult => "empty_upstream_result",
        }
    }

    fn log(&self) {
        match self {
            AppError::InvalidMethod(method) => {
                warn!(error_class = self.class(), %method, "{self}");
            }
            AppError::UnreadableBody(cause) => {
                warn!(error_class = self.class(), cause = %cause, "{self}");
            }
            AppError::InvalidJson(cause) => {
                warn!(error_class = self.class(), cause = %cause, "{self}");
            }
            AppError::Upstream(e) => {
                let cause = std::error::Error::source(e)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                error!(
                    error_class = self.class(),
                    upstream_status = e.upstream_status().map(|s| s.as_u16()),
                    transport = e.transport_kind().map(|k| k.as_str()),
                    cause = %cause,
                    "{self}"
                );
            }
            AppError::EmptyUpstreamResult => {
                error!(error_class = self.class(), "{self}");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_failure_class() {
        assert_eq!(
            AppError::InvalidMethod(Method::GET).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert_eq!(AppError::InvalidJson(json_err).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::EmptyUpstreamResult.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_errors_keep_provider_message() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = AppError::from(ProviderError::Parse {
            status: StatusCode::OK,
            source,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to parse response from external API");
        assert_eq!(err.class(), "outbound_parse_failure");
    }

    #[tokio::test]
    async fn response_is_plain_text() {
        let response = AppError::EmptyUpstreamResult.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"No response content from external API");
    }
}
