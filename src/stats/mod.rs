//! Statistics for the fan-out registry

pub mod metrics;

pub use metrics::{FanoutStats, FanoutStatsSnapshot};
