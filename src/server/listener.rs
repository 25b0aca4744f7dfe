//! HTTP server listener
//!
//! Builds the router and runs the accept loop until shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::registry::FanoutRegistry;
use crate::server::config::ServerConfig;
use crate::server::handlers::{
    handle_all_logs, handle_create_log, handle_healthy, handle_live_stream, handle_log_detail,
    handle_project_logs, handle_stats, AppState,
};
use crate::storage::{LogStore, MemoryLogStore};

/// Log ingestion and live streaming server
pub struct LogServer {
    config: ServerConfig,
    store: Arc<dyn LogStore>,
    registry: Arc<FanoutRegistry>,
    shutdown: CancellationToken,
}

impl LogServer {
    /// Create a new server backed by an in-memory store
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryLogStore::new()))
    }

    /// Create a new server with a custom log store
    pub fn with_store(config: ServerConfig, store: Arc<dyn LogStore>) -> Self {
        let registry = Arc::new(FanoutRegistry::with_config(config.registry.clone()));

        Self {
            config,
            store,
            registry,
            shutdown: CancellationToken::new(),
        }
    }

    /// Get a reference to the fan-out registry
    pub fn registry(&self) -> &Arc<FanoutRegistry> {
        &self.registry
    }

    /// Token cancelled when the server shuts down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Get the configured `host:port`
    pub fn bind_addr(&self) -> String {
        self.config.bind_addr()
    }

    /// Build the router with all routes and middleware
    pub fn router(&self) -> Router {
        let state = AppState {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            shutdown: self.shutdown.clone(),
            keep_alive: self.config.keep_alive_interval,
        };

        Router::new()
            .route("/logs", get(handle_all_logs).post(handle_create_log))
            .route("/logs/:token", get(handle_project_logs))
            .route("/logs/:token/:id", get(handle_log_detail))
            .route("/stream/:token", get(handle_live_stream))
            .route("/stats", get(handle_stats))
            .route("/-/healthy", get(handle_healthy))
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Any origin without credentials when no origins are configured,
    /// otherwise the listed origins with credentials allowed.
    fn cors_layer(&self) -> CorsLayer {
        if self.config.cors_origins.is_empty() {
            return CorsLayer::new()
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        // Wildcard methods and headers cannot be combined with credentials
        CorsLayer::new()
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` completes, every live stream is cancelled so in-flight
    /// SSE responses finish and the graceful drain can complete.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener =
            TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        tracing::info!(
            host = %self.config.host,
            addr = %listener.local_addr()?,
            "Log server listening"
        );

        let cancel = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            })
            .await?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}
