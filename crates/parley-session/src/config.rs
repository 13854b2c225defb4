use std::time::Duration;

use tracing::warn;

/// Per-session limits and timers.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How many outbound events may queue before the mailbox counts as
    /// full.
    ///
    /// Default: 256.
    pub mailbox_capacity: usize,

    /// Deadline for writing one frame to the socket. A write that takes
    /// longer ends the session.
    ///
    /// Default: 10 seconds.
    pub write_timeout: Duration,

    /// How long the outbound side may stay idle before it sends a `ping`.
    ///
    /// Default: 30 seconds.
    pub ping_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    /// Replaces zero values with the defaults.
    ///
    /// A zero capacity would make `mpsc::channel` panic, and a zero ping
    /// interval would make `tokio::time::interval_at` panic.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.mailbox_capacity == 0 {
            warn!("mailbox capacity is zero, using default");
            self.mailbox_capacity = defaults.mailbox_capacity;
        }
        if self.write_timeout.is_zero() {
            warn!("write timeout is zero, using default");
            self.write_timeout = defaults.write_timeout;
        }
        if self.ping_interval.is_zero() {
            warn!("ping interval is zero, using default");
            self.ping_interval = defaults.ping_interval;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_replaces_zero_values() {
        let config = SessionConfig {
            mailbox_capacity: 0,
            write_timeout: Duration::ZERO,
            ping_interval: Duration::ZERO,
        }
        .validated();

        assert_eq!(config.mailbox_capacity, 256);
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.ping_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_validated_keeps_positive_values() {
        let config = SessionConfig {
            mailbox_capacity: 4,
            write_timeout: Duration::from_secs(1),
            ping_interval: Duration::from_millis(500),
        }
        .validated();

        assert_eq!(config.mailbox_capacity, 4);
        assert_eq!(config.ping_interval, Duration::from_millis(500));
    }
}
