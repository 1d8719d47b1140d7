//! Chat relay handler.
//!
//! `/chat` accepts `{"user", "message"}`, forwards `message` as a single user
//! turn to the completion provider, and answers `{"reply"}` with the content
//! of the provider's first choice.
//!
//! The message is forwarded as-is, including when it is empty or missing;
//! the provider is left to reject content it does not accept.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::Method;
use relay_core::chat::{ChatRequest, ChatResponse, ProviderRequest, decode_or_default};
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// `POST /chat` — relay one message to the provider and return its reply.
pub async fn chat_handler(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> AppResult<Json<ChatResponse>> {
    if method != Method::POST {
        return Err(AppError::InvalidMethod(method));
    }

    let bytes = axum::body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(AppError::UnreadableBody)?;

    let chat: ChatRequest = decode_or_default(&bytes).map_err(AppError::InvalidJson)?;
    if chat.message.is_empty() {
        debug!("forwarding empty message");
    }

    let request = ProviderRequest::from((state.config.model.as_str(), chat));
    let response = state.provider.complete(&request).await?;

    let reply = response
        .into_first_content()
        .ok_or(AppError::EmptyUpstreamResult)?;

    debug!(reply_len = reply.len(), "relayed completion");
    Ok(Json(ChatResponse { reply }))
}
