//! Axum middleware.

pub mod logging;
