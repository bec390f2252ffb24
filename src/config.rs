//! Relay configuration from environment variables
//!
//! ```bash
//! CHAT_RELAY_HOST=0.0.0.0
//! CHAT_RELAY_PORT=5001
//! CHAT_RELAY_OUTBOX_CAPACITY=256
//! CHAT_RELAY_UNIQUE_NAMES=true
//! ```

use crate::error::{RelayError, RelayResult};

pub const HOST_VAR: &str = "CHAT_RELAY_HOST";
pub const PORT_VAR: &str = "CHAT_RELAY_PORT";
pub const OUTBOX_CAPACITY_VAR: &str = "CHAT_RELAY_OUTBOX_CAPACITY";
pub const UNIQUE_NAMES_VAR: &str = "CHAT_RELAY_UNIQUE_NAMES";

/// Runtime settings for the relay server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to bind
    pub port: u16,

    /// Events buffered per connection before new ones are dropped
    pub outbox_capacity: usize,

    /// Avoid handing out a display name that is already online
    pub unique_names: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            outbox_capacity: 256,
            unique_names: false,
        }
    }
}

impl RelayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    /// Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR) {
            let host = host.trim();
            if host.is_empty() {
                return Err(RelayError::Config(format!("{} must not be empty", HOST_VAR)));
            }
            config.host = host.to_string();
        }

        if let Some(port) = lookup(PORT_VAR) {
            config.port = port.trim().parse().map_err(|_| {
                RelayError::Config(format!("{} must be a port number, got '{}'", PORT_VAR, port))
            })?;
        }

        if let Some(capacity) = lookup(OUTBOX_CAPACITY_VAR) {
            config.outbox_capacity = match capacity.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(RelayError::Config(format!(
                        "{} must be a positive integer, got '{}'",
                        OUTBOX_CAPACITY_VAR, capacity
                    )))
                }
            };
        }

        if let Some(flag) = lookup(UNIQUE_NAMES_VAR) {
            config.unique_names = parse_bool(&flag).ok_or_else(|| {
                RelayError::Config(format!("{} must be true or false, got '{}'", UNIQUE_NAMES_VAR, flag))
            })?;
        }

        Ok(config)
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
