//! Log record types and query filtering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of records returned by a filtered query
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// JSON object attached to a log (device info, error details, custom fields)
pub type JsonObject = Map<String, Value>;

/// Ingestion request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLog {
    pub message: String,
    pub level: String,
    pub timestamp: DateTime<Utc>,
    pub token: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub device: Option<JsonObject>,
    #[serde(default)]
    pub error: Option<JsonObject>,
    #[serde(default)]
    pub custom: Option<JsonObject>,
}

/// A persisted log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: u64,
    pub message: String,
    pub level: String,
    pub timestamp: DateTime<Utc>,
    pub token: String,
    pub environment: Option<String>,
    pub device: Option<JsonObject>,
    pub error: Option<JsonObject>,
    pub custom: Option<JsonObject>,
}

impl LogRecord {
    /// Assign an ID to an ingested log
    pub fn from_new(id: u64, log: NewLog) -> Self {
        Self {
            id,
            message: log.message,
            level: log.level,
            timestamp: log.timestamp,
            token: log.token,
            environment: log.environment,
            device: log.device,
            error: log.error,
            custom: log.custom,
        }
    }

    /// `device.platform`, if present and a string
    pub fn platform(&self) -> Option<&str> {
        self.device.as_ref()?.get("platform")?.as_str()
    }

    /// `error.name`, if present and a string
    pub fn error_name(&self) -> Option<&str> {
        self.error.as_ref()?.get("name")?.as_str()
    }

    /// List view of this record
    pub fn summary(&self) -> LogSummary {
        LogSummary {
            id: self.id,
            message: self.message.clone(),
            level: self.level.clone(),
            timestamp: self.timestamp,
            token: self.token.clone(),
            environment: self.environment.clone(),
            device: self.device.clone(),
        }
    }
}

/// List view of a log record, without error and custom payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub id: u64,
    pub message: String,
    pub level: String,
    pub timestamp: DateTime<Utc>,
    pub token: String,
    pub environment: Option<String>,
    pub device: Option<JsonObject>,
}

/// Map an environment alias to its canonical name
///
/// Unknown aliases return `None`.
pub fn normalize_environment(env: &str) -> Option<&'static str> {
    match env.to_ascii_lowercase().as_str() {
        "prod" | "production" => Some("production"),
        "stag" | "staging" => Some("staging"),
        "dev" | "development" => Some("development"),
        _ => None,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Filters for querying a project's logs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LogFilter {
    /// Exact level match
    pub level: Option<String>,
    /// Environment alias; unknown aliases are ignored
    pub environment: Option<String>,
    /// Case-insensitive substring of `device.platform`
    pub os: Option<String>,
    /// Case-insensitive substring of `message` or `error.name`
    pub search: Option<String>,
    /// Only records strictly older than this
    pub before: Option<DateTime<Utc>>,
    /// Maximum number of records
    pub limit: Option<usize>,
}

impl LogFilter {
    /// Effective result limit
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_QUERY_LIMIT)
    }

    /// Whether a record passes every filter
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(ref level) = self.level {
            if &record.level != level {
                return false;
            }
        }

        if let Some(env) = self.environment.as_deref().and_then(normalize_environment) {
            if record.environment.as_deref() != Some(env) {
                return false;
            }
        }

        if let Some(ref os) = self.os {
            match record.platform() {
                Some(platform) if contains_ignore_case(platform, os) => {}
                _ => return false,
            }
        }

        if let Some(ref search) = self.search {
            let in_message = contains_ignore_case(&record.message, search);
            let in_error = record
                .error_name()
                .is_some_and(|name| contains_ignore_case(name, search));
            if !in_message && !in_error {
                return false;
            }
        }

        if let Some(before) = self.before {
            if record.timestamp >= before {
                return false;
            }
        }

        true
    }
}
