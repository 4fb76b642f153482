use std::env;
use std::str::FromStr;
use std::time::Duration;

use glossary_notify_core::model::IdStrategy;
use glossary_notify_core::ReadReconciliation;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// Base URL of the REST backend serving `/api/notifications/`.
    pub feed_base_url: String,
    /// Bearer token sent to the backend, if any.
    pub feed_token: Option<String>,
    /// Delay between two polls.
    pub poll_interval: Duration,
    /// Clustering window in minutes.
    pub group_window_minutes: i64,
    pub read_reconciliation: ReadReconciliation,
    pub id_strategy: IdStrategy,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let value = var_or(name, default);
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: name,
        reason: e.to_string(),
        value,
    })
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feed_base_url =
            env::var("FEED_BASE_URL").map_err(|_| ConfigError::Missing("FEED_BASE_URL"))?;

        let group_window_minutes: i64 = parse_var("GROUP_WINDOW_MINUTES", "30")?;
        if group_window_minutes < 0 {
            return Err(ConfigError::Invalid {
                var: "GROUP_WINDOW_MINUTES",
                value: group_window_minutes.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let poll_interval_secs: u64 = parse_var("POLL_INTERVAL_SECS", "30")?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", "3030")?,
            feed_base_url,
            feed_token: env::var("FEED_TOKEN").ok().filter(|t| !t.is_empty()),
            poll_interval: Duration::from_secs(poll_interval_secs),
            group_window_minutes,
            read_reconciliation: parse_var("READ_RECONCILIATION", "server-wins")?,
            id_strategy: parse_var("NOTIFICATION_IDS", "stable")?,
            event_bus_capacity: parse_var("EVENT_BUS_CAPACITY", "1024")?,
            log_level: var_or("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
