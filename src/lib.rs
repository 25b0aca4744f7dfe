//! Log ingestion backend with real-time fan-out to live viewers.
//!
//! Client applications post log records scoped to an opaque project token.
//! Every record is persisted and then pushed to all viewers currently
//! watching that token's live stream.
//!
//! The core is [`FanoutRegistry`]: it maps a [`ProjectToken`] to the viewers
//! registered under it, publishes serialized events to each viewer's bounded
//! queue without blocking, and hands out [`LiveStream`]s that unregister
//! themselves on every exit path.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flutrace::{EventPayload, FanoutRegistry, ProjectToken};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let registry = Arc::new(FanoutRegistry::new());
//! let token = ProjectToken::new("abc");
//!
//! let mut live = registry.listen(&token, CancellationToken::new());
//! registry.publish(&token, EventPayload::from(r#"{"message":"hello"}"#));
//!
//! assert_eq!(live.next().await.unwrap().as_str(), r#"{"message":"hello"}"#);
//! # }
//! ```

pub mod error;
pub mod model;
pub mod registry;
pub mod server;
pub mod stats;
pub mod storage;

pub use error::{Error, Result};
pub use registry::{
    EventPayload, FanoutRegistry, LiveStream, OverflowPolicy, ProjectToken, RegistryConfig,
    SubscriberHandle, SubscriberState, Subscription,
};
pub use server::{LogServer, ServerConfig};
