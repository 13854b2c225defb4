use std::time::Duration;

use tracing::warn;

/// Timing for the idle sweep.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// How often to look for idle users. Default: 60 seconds.
    pub sweep_interval: Duration,
    /// Idle time after which an online user becomes away. Default: 5 minutes.
    pub away_after: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            away_after: Duration::from_secs(300),
        }
    }
}

impl PresenceConfig {
    /// Replaces zero durations with the defaults.
    ///
    /// A zero sweep interval would make `tokio::time::interval` panic.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.sweep_interval.is_zero() {
            warn!("presence sweep interval is zero, using default");
            self.sweep_interval = defaults.sweep_interval;
        }
        if self.away_after.is_zero() {
            warn!("away threshold is zero, using default");
            self.away_after = defaults.away_after;
        }
        self
    }
}
