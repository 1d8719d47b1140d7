//! OpenAI chat-completions client.
//!
//! One `POST` per call, no retry. The whole call (connect, send, body read)
//! is bounded by the configured request timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use super::{CompletionProvider, ProviderError};
use crate::chat::{ProviderRequest, ProviderResponse, decode_or_default};
use crate::config::RelayConfig;

/// Upper bound on TCP/TLS connection setup.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of a non-success upstream body to include in logs.
const LOGGED_BODY_LIMIT: usize = 512;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    /// Builds a client with its own connection pool and the configured
    /// timeouts.
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout))
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(http: Client, config: &RelayConfig) -> Self {
        Self {
            http,
            endpoint: config.upstream_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = serde_json::to_vec(request).map_err(ProviderError::Encode)?;

        let http_request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .body(body)
            .build()
            .map_err(ProviderError::Build)?;

        debug!(endpoint = %self.endpoint, model = %request.model, "sending completion request");

        let response = self
            .http
            .execute(http_request)
            .await
            .map_err(ProviderError::Transport)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ProviderError::ReadBody { status, source })?;

        if !status.is_success() {
            // The body is still parsed below; an error payload simply has no choices.
            let text = String::from_utf8_lossy(&bytes);
            let excerpt: String = text.chars().take(LOGGED_BODY_LIMIT).collect();
            warn!(upstream_status = %status, body = %excerpt, "provider returned non-success status");
        } else {
            debug!(upstream_status = %status, bytes = bytes.len(), "completion response received");
        }

        decode_or_default(&bytes).map_err(|source| ProviderError::Parse { status, source })
    }
}
