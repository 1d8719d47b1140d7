//! Server lifecycle: bind → serve until shutdown → release.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use relay_core::config::{ConfigError, RelayConfig};
use relay_core::provider::{CompletionProvider, OpenAiClient};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppState, router};

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] io::Error),
}

/// A bound relay server. Dropping it releases the listener.
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    /// Validates `config`, builds the OpenAI client and binds the listener.
    pub async fn bind(config: RelayConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let provider = OpenAiClient::new(&config)?;
        Self::bind_with_provider(config, Arc::new(provider)).await
    }

    /// Binds the listener with an explicit provider.
    pub async fn bind_with_provider(
        config: RelayConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;

        info!(
            model = %config.model,
            upstream = %config.upstream_url,
            timeout_secs = config.request_timeout.as_secs_f64(),
            "relay configured"
        );

        let app = router(AppState::new(config, provider));
        Ok(Self { listener, app })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` is cancelled, then drains in-flight requests.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        info!(%addr, "relay listening");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!(%addr, "relay stopped");
        Ok(())
    }
}
