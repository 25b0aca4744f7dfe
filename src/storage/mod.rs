//! Log storage
//!
//! The [`LogStore`] trait is the boundary to whatever persists log records.
//! [`MemoryLogStore`] keeps everything in process memory and is what the
//! bundled server uses.

pub mod memory;

pub use memory::MemoryLogStore;

use crate::model::{LogFilter, LogRecord, NewLog};

/// Persistence for log records, keyed by project token
pub trait LogStore: Send + Sync {
    /// Persist a new log and return the stored record
    fn insert(&self, log: NewLog) -> LogRecord;

    /// Every stored record, in insertion order
    fn all(&self) -> Vec<LogRecord>;

    /// Records for `token` matching `filter`, newest first, up to the filter's limit
    fn query(&self, token: &str, filter: &LogFilter) -> Vec<LogRecord>;

    /// A single record, only if it belongs to `token`
    fn get(&self, token: &str, id: u64) -> Option<LogRecord>;
}
