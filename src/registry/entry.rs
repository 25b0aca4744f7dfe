//! Subscriber entry and handle types
//!
//! This module defines the per-subscriber state stored in the registry and the
//! consuming half handed back to the caller of `subscribe`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::error::RegistryError;
use super::frame::{EventPayload, ProjectToken};

/// Lifecycle of a live subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Registered, nothing awaited yet
    Created,
    /// Waiting on or draining its queue
    Listening,
    /// Unsubscribed; terminal
    Closed,
}

/// Identifies one subscriber for later removal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberHandle {
    /// Token the subscriber is registered under
    pub token: ProjectToken,
    /// Registry-unique subscriber ID
    pub id: u64,
}

/// Registry-side entry for a single subscriber
///
/// Holds only the sending half of the subscriber's queue, so removing the
/// entry from the registry is what closes the queue.
#[derive(Debug, Clone)]
pub struct SubscriberEntry {
    /// Registry-unique subscriber ID
    pub id: u64,

    /// When the subscriber was registered
    pub created_at: Instant,

    tx: mpsc::Sender<EventPayload>,

    /// Set by the first refused enqueue, cleared by the next accepted one
    stalled: Arc<AtomicBool>,
}

impl SubscriberEntry {
    /// Create a new entry and the receiving half of its queue
    pub(super) fn new(id: u64, capacity: usize) -> (Self, mpsc::Receiver<EventPayload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let entry = Self {
            id,
            created_at: Instant::now(),
            tx,
            stalled: Arc::new(AtomicBool::new(false)),
        };
        (entry, rx)
    }

    /// Enqueue a payload without waiting
    pub(super) fn try_deliver(
        &self,
        token: &ProjectToken,
        payload: EventPayload,
    ) -> Result<(), RegistryError> {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.stalled.store(false, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(RegistryError::QueueFull {
                token: token.clone(),
                subscriber_id: self.id,
            }),
            Err(TrySendError::Closed(_)) => Err(RegistryError::SubscriberClosed {
                token: token.clone(),
                subscriber_id: self.id,
            }),
        }
    }

    /// Mark the subscriber as stalled
    ///
    /// Returns `true` only for the first refusal since the last accepted
    /// enqueue.
    pub(super) fn mark_stalled(&self) -> bool {
        !self.stalled.swap(true, Ordering::Relaxed)
    }
}

/// Consuming half of a subscription
///
/// Dropping a `Subscription` does not unregister it; pair it with
/// `FanoutRegistry::unsubscribe` or use `FanoutRegistry::listen`, whose
/// `LiveStream` unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    handle: SubscriberHandle,
    rx: mpsc::Receiver<EventPayload>,
}

impl Subscription {
    pub(super) fn new(handle: SubscriberHandle, rx: mpsc::Receiver<EventPayload>) -> Self {
        Self { handle, rx }
    }

    /// Handle identifying this subscription
    pub fn handle(&self) -> &SubscriberHandle {
        &self.handle
    }

    /// Wait for the next payload
    ///
    /// Returns `None` once the registry has dropped this subscriber and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<EventPayload> {
        self.rx.recv().await
    }

    /// Take the next payload if one is already queued
    pub fn try_recv(&mut self) -> Option<EventPayload> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<EventPayload> {
        let mut payloads = Vec::new();
        while let Some(payload) = self.try_recv() {
            payloads.push(payload);
        }
        payloads
    }
}

/// Statistics for a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    /// Number of registered subscribers
    pub subscriber_count: usize,
    /// Age of the oldest registered subscriber, in milliseconds
    pub oldest_subscriber_age_ms: Option<u64>,
}
