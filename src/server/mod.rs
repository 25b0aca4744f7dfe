//! HTTP server: log ingestion, queries, and live streaming over SSE

pub mod config;
pub mod error;
pub mod handlers;
pub mod listener;

pub use config::{CliArgs, ServerConfig};
pub use error::ApiError;
pub use handlers::AppState;
pub use listener::LogServer;
