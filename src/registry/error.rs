//! Registry error types
//!
//! Per-subscriber delivery failures. These never escape `publish`; they are
//! logged and the remaining subscribers are still served.

use thiserror::Error;

use super::frame::ProjectToken;

/// Error type for a single subscriber enqueue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Subscriber queue is at capacity
    #[error("subscriber {subscriber_id} on {token} has a full queue")]
    QueueFull {
        token: ProjectToken,
        subscriber_id: u64,
    },
    /// Subscriber's receiving side has gone away
    #[error("subscriber {subscriber_id} on {token} is closed")]
    SubscriberClosed {
        token: ProjectToken,
        subscriber_id: u64,
    },
}
