//! Chat relay server binary.
//!
//! Binds the listener, relays `/chat` to the completion provider, and shuts
//! down gracefully on Ctrl-C or SIGTERM.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use relay_api::Server;
use relay_core::config::{
    DEFAULT_BIND_ADDR, DEFAULT_MAX_BODY_BYTES, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_UPSTREAM_URL, RelayConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// CLI arguments for the relay. Every flag can also be set through the
/// environment.
#[derive(Parser, Debug)]
#[command(name = "relay_server", version, about = "Chat relay server")]
struct Args {
    /// Address to listen on.
    #[arg(long = "bind", env = "RELAY_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Bearer credential for the completion provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Provider chat-completions endpoint.
    #[arg(long, env = "RELAY_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Model identifier sent with every completion request.
    #[arg(long, env = "RELAY_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Outbound request timeout in seconds. The inbound deadline is one
    /// second longer.
    #[arg(long, env = "RELAY_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "RELAY_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind_addr,
            api_key: args.api_key,
            upstream_url: args.upstream_url,
            model: args.model,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_body_bytes: args.max_body_bytes,
        }
    }
}

/// Resolves when the process receives Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(
                    "info,relay_api=debug,relay_core=debug",
                )),
        )
        .init();

    let args = Args::parse();
    let config = RelayConfig::from(args);

    info!(bind_addr = %config.bind_addr, version = relay_core::version(), "starting relay_server");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    match server.serve(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_config_defaults() {
        let args = Args::try_parse_from(["relay_server", "--api-key", "sk-test"]).expect("parse");
        let config = RelayConfig::from(args);
        let defaults = RelayConfig::new("sk-test");
        assert_eq!(config.bind_addr, defaults.bind_addr);
        assert_eq!(config.upstream_url, defaults.upstream_url);
        assert_eq!(config.model, defaults.model);
        assert_eq!(config.request_timeout, defaults.request_timeout);
        assert_eq!(config.max_body_bytes, defaults.max_body_bytes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "relay_server",
            "--api-key",
            "sk-test",
            "--bind",
            "127.0.0.1:9999",
            "--model",
            "gpt-4o",
            "--request-timeout-secs",
            "5",
        ])
        .expect("parse");
        let config = RelayConfig::from(args);
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_numbers_are_rejected_at_parse_time() {
        let err = Args::try_parse_from([
            "relay_server",
            "--api-key",
            "sk-test",
            "--request-timeout-secs",
            "soon",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parsed_config_still_goes_through_validation() {
        let args = Args::try_parse_from([
            "relay_server",
            "--api-key",
            "sk-test",
            "--request-timeout-secs",
            "0",
        ])
        .expect("parse");
        let err = RelayConfig::from(args).validate().unwrap_err();
        assert!(err.to_string().contains("RELAY_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn clap_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
