//! Live stream consumption
//!
//! A [`LiveStream`] owns one subscription for the lifetime of a viewer's
//! connection. It unregisters itself exactly once, whichever way the
//! connection ends: cancellation, eviction by the registry, or simply being
//! dropped when the transport task is torn down.

use std::sync::Arc;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use super::entry::{SubscriberHandle, SubscriberState, Subscription};
use super::frame::{EventPayload, ProjectToken};
use super::store::FanoutRegistry;

/// Sequence of events for one live viewer
pub struct LiveStream {
    registry: Arc<FanoutRegistry>,
    subscription: Subscription,
    cancel: CancellationToken,
    state: SubscriberState,
}

impl LiveStream {
    pub(super) fn new(
        registry: Arc<FanoutRegistry>,
        subscription: Subscription,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            subscription,
            cancel,
            state: SubscriberState::Created,
        }
    }

    /// Token this stream is registered under
    pub fn token(&self) -> &ProjectToken {
        &self.subscription.handle().token
    }

    /// Handle of the underlying subscription
    pub fn handle(&self) -> &SubscriberHandle {
        self.subscription.handle()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the stream is closed. Cancellation wins over
    /// queued events.
    pub async fn next(&mut self) -> Option<EventPayload> {
        if self.state == SubscriberState::Closed {
            return None;
        }
        self.state = SubscriberState::Listening;

        let next = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            payload = self.subscription.recv() => payload,
        };

        if next.is_none() {
            self.close();
        }
        next
    }

    /// Close the stream and unregister from the registry
    pub fn close(&mut self) {
        if self.state == SubscriberState::Closed {
            return;
        }
        self.state = SubscriberState::Closed;
        self.registry.unsubscribe(self.subscription.handle());

        tracing::debug!(
            token = %self.token(),
            subscriber_id = self.handle().id,
            "Live stream closed"
        );
    }

    /// Adapt into a `Stream` for transports that consume one
    pub fn into_stream(self) -> impl Stream<Item = EventPayload> + Send + 'static {
        futures_util::stream::unfold(self, |mut live| async move {
            let payload = live.next().await?;
            Some((payload, live))
        })
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("handle", self.handle())
            .field("state", &self.state)
            .finish()
    }
}
