//! Configuration for the synchronization core.

use quire_core::defaults;

/// Configuration for a [`SyncCore`](crate::SyncCore) and the sessions it
/// constructs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Buffer capacity of the transient status-message channel.
    pub message_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            message_capacity: defaults::MESSAGE_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `QUIRE_MESSAGE_CAPACITY` | `32` | Status-message channel capacity |
    pub fn from_env() -> Self {
        let message_capacity = std::env::var("QUIRE_MESSAGE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults::MESSAGE_CAPACITY);

        Self { message_capacity }
    }

    /// Set the status-message channel capacity.
    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(
            SyncConfig::default().message_capacity,
            defaults::MESSAGE_CAPACITY
        );
    }

    #[test]
    fn test_builder() {
        let config = SyncConfig::default().with_message_capacity(8);
        assert_eq!(config.message_capacity, 8);
    }
}
