//! # relay_core
//!
//! Core domain logic for the chat relay: wire types, the completion provider
//! seam and its OpenAI client, and configuration.

pub mod chat;
pub mod config;
pub mod provider;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
