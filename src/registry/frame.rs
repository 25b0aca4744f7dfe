//! Fan-out key and payload types
//!
//! This module defines the key type for identifying a project's live feed and
//! the serialized payload that is fanned out to subscribers.

use bytes::Bytes;
use serde::Serialize;

/// Opaque project token identifying a project's log feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectToken(String);

impl ProjectToken {
    /// Create a new project token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ProjectToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// A serialized event ready to be written to a live viewer
///
/// Cheap to clone: the inner `Bytes` is reference counted, so every
/// subscriber shares the allocation produced by a single serialization.
/// Always holds valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload {
    data: Bytes,
}

impl EventPayload {
    /// Wrap an already-serialized text payload
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(text.into()),
        }
    }

    /// Serialize a value to JSON once
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        let data = serde_json::to_vec(value)?;
        Ok(Self {
            data: Bytes::from(data),
        })
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Payload as text
    pub fn as_str(&self) -> &str {
        // Constructors only accept `String` or serde_json output.
        std::str::from_utf8(&self.data).unwrap_or_default()
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&str> for EventPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for EventPayload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
