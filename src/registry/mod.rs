//! Live log fan-out registry
//!
//! The registry tracks live viewers per project token and routes newly
//! ingested log events to every one of them. Each viewer gets its own bounded
//! `tokio::sync::mpsc` queue, so a stalled viewer only ever affects itself.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<FanoutRegistry>
//!                     ┌──────────────────────────┐
//!                     │ subscribers: HashMap<    │
//!                     │   ProjectToken,          │
//!                     │   Vec<SubscriberEntry {  │
//!                     │     tx: mpsc::Sender,    │
//!                     │   }>                     │
//!                     │ >                        │
//!                     └────────────┬─────────────┘
//!                                  │
//!         ┌────────────────────────┼────────────────────────┐
//!         │                        │                        │
//!         ▼                        ▼                        ▼
//!    [Ingestion]             [LiveStream]             [LiveStream]
//!    POST /logs              rx.recv() / cancel       rx.recv() / cancel
//!         │                        │                        │
//!         └──► registry.publish() ─┴──► SSE frame ──► HTTP ─┘
//! ```
//!
//! # Zero-Copy Design
//!
//! A log record is serialized once per publish into an [`EventPayload`]
//! backed by `bytes::Bytes`; each subscriber queue receives a reference-counted
//! clone of the same allocation.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod listen;
pub mod store;

pub use config::{OverflowPolicy, RegistryConfig};
pub use entry::{SubscriberHandle, SubscriberState, Subscription, TokenStats};
pub use error::RegistryError;
pub use frame::{EventPayload, ProjectToken};
pub use listen::LiveStream;
pub use store::FanoutRegistry;
