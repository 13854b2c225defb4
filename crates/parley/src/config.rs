//! Server configuration loaded from environment variables.
//!
//! Every setting has a default, so the server starts with no
//! configuration at all. Invalid values are logged and ignored.

use std::str::FromStr;
use std::time::Duration;

use parley_presence::PresenceConfig;
use parley_router::RouterConfig;
use parley_session::SessionConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    /// Env: `BIND_ADDR` (host:port) or `SERVER_PORT` (port only, all
    /// interfaces)
    /// Default: `0.0.0.0:8080`
    pub bind_addr: String,

    /// How long a new connection has to send its `auth` message.
    /// Env: `AUTH_READ_TIMEOUT_SECS`
    /// Default: 30 seconds
    pub auth_read_timeout: Duration,

    /// Deadline for writing the `auth_response`.
    /// Env: `AUTH_WRITE_TIMEOUT_SECS`
    /// Default: 5 seconds
    pub auth_write_timeout: Duration,

    /// Capacity of the shared broadcast queue.
    /// Env: `BROADCAST_CAPACITY`
    /// Default: 100
    pub broadcast_capacity: usize,

    /// Age after which notifications are pruned.
    /// Env: `NOTIFICATION_RETENTION_SECS`
    /// Default: 7 days
    pub notification_retention: Duration,

    /// How often the notification pruner runs. Default: 1 hour.
    pub notification_prune_interval: Duration,

    /// Mailbox capacity, write deadline, keepalive ping.
    pub session: SessionConfig,

    /// Idle sweep timing.
    pub presence: PresenceConfig,

    /// History sizes.
    pub router: RouterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            auth_read_timeout: Duration::from_secs(30),
            auth_write_timeout: Duration::from_secs(5),
            broadcast_capacity: 100,
            notification_retention: Duration::from_secs(7 * 24 * 60 * 60),
            notification_prune_interval: Duration::from_secs(60 * 60),
            session: SessionConfig::default(),
            presence: PresenceConfig::default(),
            router: RouterConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        } else if let Some(port) = parsed::<u16>(&lookup, "SERVER_PORT") {
            config.bind_addr = format!("0.0.0.0:{port}");
        }

        if let Some(secs) = positive_secs(&lookup, "AUTH_READ_TIMEOUT_SECS") {
            config.auth_read_timeout = secs;
        }
        if let Some(secs) = positive_secs(&lookup, "AUTH_WRITE_TIMEOUT_SECS") {
            config.auth_write_timeout = secs;
        }
        if let Some(n) = positive(&lookup, "BROADCAST_CAPACITY") {
            config.broadcast_capacity = n;
        }
        if let Some(secs) = positive_secs(&lookup, "NOTIFICATION_RETENTION_SECS") {
            config.notification_retention = secs;
        }

        if let Some(n) = positive(&lookup, "MAILBOX_CAPACITY") {
            config.session.mailbox_capacity = n;
        }
        if let Some(secs) = positive_secs(&lookup, "WRITE_TIMEOUT_SECS") {
            config.session.write_timeout = secs;
        }
        if let Some(secs) = positive_secs(&lookup, "PING_INTERVAL_SECS") {
            config.session.ping_interval = secs;
        }

        if let Some(secs) = positive_secs(&lookup, "PRESENCE_SWEEP_SECS") {
            config.presence.sweep_interval = secs;
        }
        if let Some(secs) = positive_secs(&lookup, "AWAY_AFTER_SECS") {
            config.presence.away_after = secs;
        }

        if let Some(n) = positive(&lookup, "HISTORY_LIMIT") {
            config.router.history_limit = n;
        }

        config
    }
}

impl ServerConfig {
    /// Replaces zero values with the defaults, including the nested
    /// session and presence settings.
    ///
    /// Zero capacities and intervals would panic in `mpsc::channel` or
    /// `tokio::time::interval_at`; [`ParleyServerBuilder::build`] calls
    /// this before wiring anything.
    ///
    /// [`ParleyServerBuilder::build`]: crate::ParleyServerBuilder::build
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.auth_read_timeout.is_zero() {
            tracing::warn!("auth read timeout is zero, using default");
            self.auth_read_timeout = defaults.auth_read_timeout;
        }
        if self.auth_write_timeout.is_zero() {
            tracing::warn!("auth write timeout is zero, using default");
            self.auth_write_timeout = defaults.auth_write_timeout;
        }
        if self.broadcast_capacity == 0 {
            tracing::warn!("broadcast capacity is zero, using default");
            self.broadcast_capacity = defaults.broadcast_capacity;
        }
        if self.notification_retention.is_zero() {
            tracing::warn!("notification retention is zero, using default");
            self.notification_retention = defaults.notification_retention;
        }
        if self.notification_prune_interval.is_zero() {
            tracing::warn!("notification prune interval is zero, using default");
            self.notification_prune_interval = defaults.notification_prune_interval;
        }
        self.session = self.session.validated();
        self.presence = self.presence.validated();
        self
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid config value, using default");
            None
        }
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    match parsed::<usize>(lookup, key)? {
        0 => {
            tracing::warn!(key, "config value must be positive, using default");
            None
        }
        n => Some(n),
    }
}

fn positive_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    positive(lookup, key).map(|secs| Duration::from_secs(secs as u64))
}
