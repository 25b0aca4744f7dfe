//! Server configuration

use std::time::Duration;

use clap::Parser;

use crate::error::{Error, Result};
use crate::registry::{OverflowPolicy, RegistryConfig};

/// Command-line arguments for the server binary
#[derive(Debug, Clone, Parser)]
#[command(name = "flutrace", about = "Log ingestion server with live streaming")]
pub struct CliArgs {
    /// Host to bind to (IP address or hostname)
    #[arg(long, env = "FLUTRACE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(long, env = "FLUTRACE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Maximum undelivered events held per live viewer
    #[arg(long, env = "FLUTRACE_QUEUE_CAPACITY", default_value_t = 1024)]
    pub queue_capacity: usize,

    /// What to do with a viewer whose queue is full: drop-newest or disconnect
    #[arg(long, env = "FLUTRACE_OVERFLOW", default_value = "drop-newest")]
    pub overflow: OverflowPolicy,

    /// Seconds between keep-alive frames on live streams
    #[arg(long, env = "FLUTRACE_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub keep_alive_secs: u64,

    /// Allowed CORS origin; repeat for several
    #[arg(long = "cors-origin", env = "FLUTRACE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to; resolved when the listener is bound
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// CORS allowed origins; empty means any origin
    pub cors_origins: Vec<String>,

    /// Interval between SSE keep-alive comments on live streams
    pub keep_alive_interval: Duration,

    /// Fan-out registry configuration
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:8080".to_string()],
            keep_alive_interval: Duration::from_secs(15),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom host and port
    pub fn with_addr(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Build a config from command-line arguments
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let host = args.host.trim();
        if host.is_empty() {
            return Err(Error::InvalidConfig("host must not be empty".to_string()));
        }

        let registry = RegistryConfig::default()
            .queue_capacity(args.queue_capacity)
            .overflow_policy(args.overflow);

        let mut config = Self::with_addr(host, args.port)
            .keep_alive_interval(Duration::from_secs(args.keep_alive_secs.max(1)))
            .registry(registry);
        if !args.cors_origins.is_empty() {
            config = config.cors_origins(args.cors_origins.clone());
        }
        Ok(config)
    }

    /// Set the bind host and port
    pub fn bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set allowed CORS origins
    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the SSE keep-alive interval
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// `host:port` as configured, before resolution
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
