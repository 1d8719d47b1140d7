//! # relay_api
//!
//! HTTP API library for the chat relay.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{any, get};
use relay_core::config::RelayConfig;
use relay_core::provider::CompletionProvider;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{chat, health};

pub use server::{Server, ServerError};

/// Route paths.
pub mod routes {
    pub const CHAT: &str = "/chat";
    pub const HEALTHZ: &str = "/healthz";
}

/// Extra time the inbound deadline allows beyond the outbound timeout, so a
/// stalled provider surfaces as an outbound failure rather than a 408.
pub const INBOUND_GRACE: Duration = Duration::from_secs(1);

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay configuration.
    pub config: Arc<RelayConfig>,
    /// Outbound completion provider.
    pub provider: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub fn new(config: RelayConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let inbound_deadline = state.config.request_timeout + INBOUND_GRACE;

    Router::new()
        // Method gating happens in the handler so every non-POST request,
        // preflight `OPTIONS` included, gets the relay's own plain-text 405.
        .route(routes::CHAT, any(chat::chat_handler))
        .route(routes::HEALTHZ, get(health::healthz))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::logging::log_requests))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    inbound_deadline,
                )),
        )
        .with_state(state)
}
