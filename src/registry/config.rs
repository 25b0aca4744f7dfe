//! Registry configuration

use std::str::FromStr;

/// What to do when a subscriber's queue is full at publish time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the event for that subscriber only
    #[default]
    DropNewest,
    /// Remove the subscriber from the registry, ending its stream
    Disconnect,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop-newest" | "drop" => Ok(OverflowPolicy::DropNewest),
            "disconnect" => Ok(OverflowPolicy::Disconnect),
            other => Err(format!("unknown overflow policy: {}", other)),
        }
    }
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowPolicy::DropNewest => f.write_str("drop-newest"),
            OverflowPolicy::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// Configuration for the fan-out registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of undelivered events held per subscriber
    pub queue_capacity: usize,

    /// Policy applied when a subscriber's queue is full
    pub overflow_policy: OverflowPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            overflow_policy: OverflowPolicy::DropNewest,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber queue capacity (minimum 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the overflow policy
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.overflow_policy, OverflowPolicy::DropNewest);
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        let config = RegistryConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .queue_capacity(8)
            .overflow_policy(OverflowPolicy::Disconnect);

        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.overflow_policy, OverflowPolicy::Disconnect);
    }

    #[test]
    fn test_overflow_policy_parse() {
        assert_eq!("drop-newest".parse(), Ok(OverflowPolicy::DropNewest));
        assert_eq!("Disconnect".parse(), Ok(OverflowPolicy::Disconnect));
        assert!("drop-oldest".parse::<OverflowPolicy>().is_err());
    }
}
