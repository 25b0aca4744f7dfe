//! Log data model

pub mod log;

pub use log::{
    normalize_environment, JsonObject, LogFilter, LogRecord, LogSummary, NewLog,
    DEFAULT_QUERY_LIMIT,
};
