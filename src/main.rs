//! Flutrace server binary entry point.

use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use flutrace::server::{CliArgs, LogServer, ServerConfig};

#[tokio::main]
async fn main() -> flutrace::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = ServerConfig::from_args(&args)?;

    tracing::info!(
        addr = %config.bind_addr(),
        keep_alive_secs = config.keep_alive_interval.as_secs(),
        queue_capacity = config.registry.queue_capacity,
        overflow = %config.registry.overflow_policy,
        "Starting flutrace"
    );

    let server = LogServer::new(config);
    server.run_until(shutdown_signal()).await
}

/// Wait for SIGTERM or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
