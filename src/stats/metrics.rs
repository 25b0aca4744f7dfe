//! Fan-out statistics
//!
//! Counters are plain relaxed atomics; they are observational only and never
//! feed back into delivery decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry-wide counters
#[derive(Debug, Default)]
pub struct FanoutStats {
    events_published: AtomicU64,
    deliveries: AtomicU64,
    dropped: AtomicU64,
    subscribers_opened: AtomicU64,
    subscribers_closed: AtomicU64,
}

impl FanoutStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_publish(&self, delivered: usize, dropped: usize) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_subscribe(&self) {
        self.subscribers_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unsubscribe(&self) {
        self.subscribers_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters
    pub fn snapshot(&self) -> FanoutStatsSnapshot {
        let opened = self.subscribers_opened.load(Ordering::Relaxed);
        let closed = self.subscribers_closed.load(Ordering::Relaxed);

        FanoutStatsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            subscribers_opened: opened,
            subscribers_closed: closed,
            active_subscribers: opened.saturating_sub(closed),
        }
    }
}

/// Serializable copy of [`FanoutStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FanoutStatsSnapshot {
    /// Publish calls, including those with no subscribers
    pub events_published: u64,
    /// Payloads accepted by subscriber queues
    pub deliveries: u64,
    /// Payloads a subscriber queue refused
    pub dropped: u64,
    /// Subscriptions ever created
    pub subscribers_opened: u64,
    /// Subscriptions removed from the registry
    pub subscribers_closed: u64,
    /// Currently registered subscriptions
    pub active_subscribers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = FanoutStats::new();
        assert_eq!(stats.snapshot(), FanoutStatsSnapshot::default());
    }

    #[test]
    fn test_stats_counts() {
        let stats = FanoutStats::new();
        stats.record_subscribe();
        stats.record_subscribe();
        stats.record_unsubscribe();
        stats.record_publish(1, 0);
        stats.record_publish(0, 1);

        let snap = stats.snapshot();
        assert_eq!(snap.events_published, 2);
        assert_eq!(snap.deliveries, 1);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.subscribers_opened, 2);
        assert_eq!(snap.subscribers_closed, 1);
        assert_eq!(snap.active_subscribers, 1);
    }
}
