//! Fan-out registry implementation
//!
//! The central registry that tracks live viewers per project token and routes
//! newly ingested log events to them.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::config::{OverflowPolicy, RegistryConfig};
use super::entry::{SubscriberEntry, SubscriberHandle, Subscription, TokenStats};
use super::error::RegistryError;
use super::frame::{EventPayload, ProjectToken};
use super::listen::LiveStream;
use crate::stats::{FanoutStats, FanoutStatsSnapshot};

/// Central registry for all live subscribers
///
/// The map lock is only held to look up, append, remove, or snapshot a
/// token's subscribers. Enqueueing happens after the lock is released, so a
/// slow subscriber never blocks publishers or other subscribers.
pub struct FanoutRegistry {
    /// Map of project token to its subscribers, in registration order
    subscribers: RwLock<HashMap<ProjectToken, Vec<SubscriberEntry>>>,

    next_subscriber_id: AtomicU64,

    stats: FanoutStats,

    config: RegistryConfig,
}

impl FanoutRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(1),
            stats: FanoutStats::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new subscriber under `token`
    ///
    /// No check is made that the token belongs to a known project.
    pub fn subscribe(&self, token: &ProjectToken) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (entry, rx) = SubscriberEntry::new(id, self.config.queue_capacity);

        let count = {
            let mut subscribers = self.subscribers.write();
            let list = subscribers.entry(token.clone()).or_default();
            list.push(entry);
            list.len()
        };
        self.stats.record_subscribe();

        tracing::debug!(
            token = %token,
            subscriber_id = id,
            subscribers = count,
            "Subscriber added"
        );

        let handle = SubscriberHandle {
            token: token.clone(),
            id,
        };
        Subscription::new(handle, rx)
    }

    /// Remove a subscriber
    ///
    /// Idempotent: removing an unknown or already removed handle is a no-op.
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.remove(&handle.token, handle.id);
    }

    /// Remove a subscriber, returning whether it was still registered
    fn remove(&self, token: &ProjectToken, subscriber_id: u64) -> bool {
        let remaining = {
            let mut subscribers = self.subscribers.write();
            let Some(list) = subscribers.get_mut(token) else {
                return false;
            };
            let Some(pos) = list.iter().position(|e| e.id == subscriber_id) else {
                return false;
            };
            list.remove(pos);

            let remaining = list.len();
            if remaining == 0 {
                subscribers.remove(token);
            }
            remaining
        };
        self.stats.record_unsubscribe();

        tracing::debug!(
            token = %token,
            subscriber_id = subscriber_id,
            subscribers = remaining,
            "Subscriber removed"
        );
        true
    }

    /// Enqueue a payload onto every subscriber registered under `token`
    ///
    /// Never waits on a subscriber. Returns the number of queues that accepted
    /// the payload; zero subscribers is not an error. A refused enqueue only
    /// affects that subscriber.
    pub fn publish(&self, token: &ProjectToken, payload: EventPayload) -> usize {
        let targets: Vec<SubscriberEntry> = match self.subscribers.read().get(token) {
            Some(list) => list.clone(),
            None => Vec::new(),
        };

        if targets.is_empty() {
            self.stats.record_publish(0, 0);
            tracing::trace!(token = %token, "Publish with no subscribers");
            return 0;
        }

        let mut delivered = 0;
        let mut dropped = 0;
        let mut evicted = Vec::new();

        for entry in &targets {
            match entry.try_deliver(token, payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err @ RegistryError::QueueFull { .. }) => {
                    dropped += 1;
                    if entry.mark_stalled() {
                        tracing::warn!(
                            error = %err,
                            policy = %self.config.overflow_policy,
                            "Subscriber queue full"
                        );
                    } else {
                        tracing::debug!(error = %err, "Subscriber still stalled");
                    }
                    if self.config.overflow_policy == OverflowPolicy::Disconnect {
                        evicted.push(entry.id);
                    }
                }
                Err(err @ RegistryError::SubscriberClosed { .. }) => {
                    dropped += 1;
                    tracing::debug!(error = %err, "Dropping stale subscriber");
                    evicted.push(entry.id);
                }
            }
        }

        // Release our sender clones before eviction so evicted queues close.
        drop(targets);
        for id in evicted {
            self.remove(token, id);
        }

        self.stats.record_publish(delivered, dropped);
        tracing::trace!(
            token = %token,
            delivered = delivered,
            dropped = dropped,
            bytes = payload.len(),
            "Event published"
        );

        delivered
    }

    /// Serialize a new log record once and fan it out
    ///
    /// Failures are logged and swallowed; ingestion must not fail because of
    /// live delivery.
    pub fn notify_new_log<T: Serialize + ?Sized>(&self, token: &ProjectToken, record: &T) -> usize {
        match EventPayload::from_json(record) {
            Ok(payload) => self.publish(token, payload),
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Failed to serialize live event");
                0
            }
        }
    }

    /// Open a live stream for `token`
    ///
    /// The stream ends when `cancel` fires or when the registry drops the
    /// subscriber. Dropping the stream unsubscribes it.
    pub fn listen(self: &Arc<Self>, token: &ProjectToken, cancel: CancellationToken) -> LiveStream {
        let subscription = self.subscribe(token);
        LiveStream::new(Arc::clone(self), subscription, cancel)
    }

    /// Number of subscribers registered under `token`
    pub fn subscriber_count(&self, token: &ProjectToken) -> usize {
        self.subscribers.read().get(token).map_or(0, Vec::len)
    }

    /// Number of tokens with at least one subscriber
    pub fn token_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Get statistics for a single token
    pub fn token_stats(&self, token: &ProjectToken) -> Option<TokenStats> {
        let subscribers = self.subscribers.read();
        subscribers.get(token).map(|list| Self::summarize(list))
    }

    /// Statistics for every token with at least one subscriber
    pub fn all_token_stats(&self) -> BTreeMap<ProjectToken, TokenStats> {
        self.subscribers
            .read()
            .iter()
            .map(|(token, list)| (token.clone(), Self::summarize(list)))
            .collect()
    }

    fn summarize(list: &[SubscriberEntry]) -> TokenStats {
        TokenStats {
            subscriber_count: list.len(),
            oldest_subscriber_age_ms: list
                .iter()
                .map(|e| e.created_at.elapsed().as_millis() as u64)
                .max(),
        }
    }

    /// Registry-wide counters
    pub fn stats(&self) -> FanoutStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for FanoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> ProjectToken {
        ProjectToken::new(s)
    }

    #[test]
    fn test_publish_without_subscribers() {
        let registry = FanoutRegistry::new();

        let delivered = registry.publish(&token("nobody"), EventPayload::from("e"));

        assert_eq!(delivered, 0);
        assert_eq!(registry.token_count(), 0);
        assert_eq!(registry.stats().events_published, 1);
    }

    #[test]
    fn test_subscribe_and_publish() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let mut sub = registry.subscribe(&abc);
        registry.publish(&abc, EventPayload::from("e1"));
        registry.publish(&abc, EventPayload::from("e2"));
        registry.publish(&token("xyz"), EventPayload::from("e3"));

        let received = sub.drain();
        assert_eq!(received, vec![EventPayload::from("e1"), EventPayload::from("e2")]);
    }

    #[test]
    fn test_two_subscribers_receive_same_event() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let mut s1 = registry.subscribe(&abc);
        let mut s2 = registry.subscribe(&abc);

        assert_eq!(registry.publish(&abc, EventPayload::from("e")), 2);
        assert_eq!(s1.try_recv(), Some(EventPayload::from("e")));
        assert_eq!(s2.try_recv(), Some(EventPayload::from("e")));
    }

    #[test]
    fn test_unsubscribe_isolated() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let mut s1 = registry.subscribe(&abc);
        let mut s2 = registry.subscribe(&abc);

        registry.unsubscribe(s1.handle());
        registry.publish(&abc, EventPayload::from("e1"));

        assert_eq!(s2.try_recv(), Some(EventPayload::from("e1")));
        assert_eq!(s1.try_recv(), None);
        assert_eq!(registry.subscriber_count(&abc), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let s1 = registry.subscribe(&abc);
        let mut s2 = registry.subscribe(&abc);

        registry.unsubscribe(s1.handle());
        registry.unsubscribe(s1.handle());
        registry.unsubscribe(&SubscriberHandle {
            token: abc.clone(),
            id: 9999,
        });
        registry.unsubscribe(&SubscriberHandle {
            token: token("never"),
            id: 1,
        });

        assert_eq!(registry.subscriber_count(&abc), 1);
        assert_eq!(registry.stats().subscribers_closed, 1);

        registry.publish(&abc, EventPayload::from("still here"));
        assert_eq!(s2.try_recv(), Some(EventPayload::from("still here")));
    }

    #[test]
    fn test_empty_token_entry_removed() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let sub = registry.subscribe(&abc);
        assert_eq!(registry.token_count(), 1);

        registry.unsubscribe(sub.handle());
        assert_eq!(registry.token_count(), 0);
        assert!(registry.token_stats(&abc).is_none());
    }

    #[test]
    fn test_drop_newest_on_full_queue() {
        let config = RegistryConfig::default().queue_capacity(2);
        let registry = FanoutRegistry::with_config(config);
        let abc = token("abc");

        let mut slow = registry.subscribe(&abc);
        let mut fast = registry.subscribe(&abc);

        registry.publish(&abc, EventPayload::from("e1"));
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e1")));
        registry.publish(&abc, EventPayload::from("e2"));
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e2")));

        // slow now holds two events; the third is dropped for it only
        assert_eq!(registry.publish(&abc, EventPayload::from("e3")), 1);
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e3")));

        assert_eq!(
            slow.drain(),
            vec![EventPayload::from("e1"), EventPayload::from("e2")]
        );
        assert_eq!(registry.subscriber_count(&abc), 2);
        assert_eq!(registry.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_disconnect_on_full_queue() {
        let config = RegistryConfig::default()
            .queue_capacity(1)
            .overflow_policy(OverflowPolicy::Disconnect);
        let registry = FanoutRegistry::with_config(config);
        let abc = token("abc");

        let mut slow = registry.subscribe(&abc);
        registry.publish(&abc, EventPayload::from("e1"));
        registry.publish(&abc, EventPayload::from("e2"));

        assert_eq!(registry.subscriber_count(&abc), 0);
        assert_eq!(slow.recv().await, Some(EventPayload::from("e1")));
        assert_eq!(slow.recv().await, None);
    }

    #[test]
    fn test_closed_subscriber_evicted_on_publish() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let sub = registry.subscribe(&abc);
        drop(sub);

        assert_eq!(registry.publish(&abc, EventPayload::from("e")), 0);
        assert_eq!(registry.subscriber_count(&abc), 0);
    }

    #[test]
    fn test_notify_new_log_serializes_once() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let mut s1 = registry.subscribe(&abc);
        let mut s2 = registry.subscribe(&abc);

        let record = serde_json::json!({"id": 1, "message": "boot"});
        assert_eq!(registry.notify_new_log(&abc, &record), 2);

        let p1 = s1.try_recv().unwrap();
        let p2 = s2.try_recv().unwrap();
        assert_eq!(p1.as_str(), r#"{"id":1,"message":"boot"}"#);
        assert_eq!(p1.as_bytes().as_ptr(), p2.as_bytes().as_ptr());
    }

    #[test]
    fn test_token_stats() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");

        let _s1 = registry.subscribe(&abc);
        let _s2 = registry.subscribe(&abc);

        let _x = registry.subscribe(&token("xyz"));

        let stats = registry.token_stats(&abc).unwrap();
        assert_eq!(stats.subscriber_count, 2);
        assert!(stats.oldest_subscriber_age_ms.is_some());

        let all = registry.all_token_stats();
        let counts: Vec<(&str, usize)> = all
            .iter()
            .map(|(t, s)| (t.as_str(), s.subscriber_count))
            .collect();
        assert_eq!(counts, vec![("abc", 2), ("xyz", 1)]);
    }

    #[test]
    fn test_notify_new_log_swallows_serialize_error() {
        let registry = FanoutRegistry::new();
        let abc = token("abc");
        let mut sub = registry.subscribe(&abc);

        // serde_json refuses non-string map keys
        let mut record: HashMap<Vec<u8>, u8> = HashMap::new();
        record.insert(vec![1, 2], 3);

        assert_eq!(registry.notify_new_log(&abc, &record), 0);
        assert_eq!(sub.try_recv(), None);
        assert_eq!(registry.subscriber_count(&abc), 1);
        assert_eq!(registry.stats().events_published, 0);

        registry.notify_new_log(&abc, &serde_json::json!({"id": 2}));
        assert_eq!(sub.try_recv().unwrap().as_str(), r#"{"id":2}"#);
    }

    #[test]
    fn test_disconnect_evicts_only_slow_subscriber() {
        let config = RegistryConfig::default()
            .queue_capacity(1)
            .overflow_policy(OverflowPolicy::Disconnect);
        let registry = FanoutRegistry::with_config(config);
        let abc = token("abc");

        let mut slow = registry.subscribe(&abc);
        let mut fast = registry.subscribe(&abc);

        assert_eq!(registry.publish(&abc, EventPayload::from("e1")), 2);
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e1")));

        assert_eq!(registry.publish(&abc, EventPayload::from("e2")), 1);
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e2")));
        assert_eq!(registry.subscriber_count(&abc), 1);

        assert_eq!(registry.publish(&abc, EventPayload::from("e3")), 1);
        assert_eq!(fast.try_recv(), Some(EventPayload::from("e3")));

        assert_eq!(slow.drain(), vec![EventPayload::from("e1")]);
        assert_eq!(registry.stats().subscribers_closed, 1);
        assert_eq!(registry.stats().dropped, 1);
    }
}
