//! In-memory log store

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::LogStore;
use crate::model::{LogFilter, LogRecord, NewLog};

/// Log store backed by a vector in process memory
#[derive(Debug)]
pub struct MemoryLogStore {
    records: RwLock<Vec<LogRecord>>,
    next_id: AtomicU64,
}

impl MemoryLogStore {
    /// Create an empty store; IDs start at 1
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for MemoryLogStore {
    fn insert(&self, log: NewLog) -> LogRecord {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = LogRecord::from_new(id, log);
        self.records.write().push(record.clone());
        record
    }

    fn all(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    fn query(&self, token: &str, filter: &LogFilter) -> Vec<LogRecord> {
        let mut matched: Vec<LogRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.token == token && filter.matches(r))
            .cloned()
            .collect();

        // Newest first; ties put the later insert first.
        matched.sort_by_key(|r| r.timestamp);
        matched.reverse();
        matched.truncate(filter.limit());
        matched
    }

    fn get(&self, token: &str, id: u64) -> Option<LogRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.id == id && r.token == token)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn new_log(token: &str, message: &str, minute: u32) -> NewLog {
        NewLog {
            message: message.to_string(),
            level: "info".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            token: token.to_string(),
            environment: None,
            device: None,
            error: None,
            custom: None,
        }
    }

    #[test]
    fn test_insert_assigns_ids() {
        let store = MemoryLogStore::new();
        assert!(store.is_empty());

        let a = store.insert(new_log("abc", "a", 0));
        let b = store.insert(new_log("abc", "b", 1));

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_query_newest_first_with_limit() {
        let store = MemoryLogStore::new();
        store.insert(new_log("abc", "first", 0));
        store.insert(new_log("abc", "third", 2));
        store.insert(new_log("abc", "second", 1));
        store.insert(new_log("xyz", "other", 3));

        let filter = LogFilter {
            limit: Some(2),
            ..Default::default()
        };
        let messages: Vec<String> = store
            .query("abc", &filter)
            .into_iter()
            .map(|r| r.message)
            .collect();

        assert_eq!(messages, vec!["third", "second"]);
    }

    #[test]
    fn test_get_scoped_to_token() {
        let store = MemoryLogStore::new();
        let record = store.insert(new_log("abc", "a", 0));

        assert_eq!(store.get("abc", record.id), Some(record.clone()));
        assert_eq!(store.get("xyz", record.id), None);
        assert_eq!(store.get("abc", 42), None);
    }
}
