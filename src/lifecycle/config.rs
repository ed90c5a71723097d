//! Runtime configuration, read from environment variables.

use crate::table_actor::DEFAULT_EXPIRY_WINDOW;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration for a [`TableOrderSystem`](super::TableOrderSystem).
///
/// # Environment Variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | TABLE_EXPIRY_SECS | 10800 | Auto-close window of an open table |
/// | ACTOR_IDLE_SECS | 600 | Evict idle actors after this long (`0` keeps them resident) |
/// | ACTOR_MAILBOX_CAPACITY | 32 | Queued requests per table before callers wait |
/// | TABLE_STATE_DIR | unset | Persist to JSON files here instead of memory |
///
/// # Example
///
/// ```ignore
/// TABLE_EXPIRY_SECS=60 TABLE_STATE_DIR=/var/lib/tables cargo run
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableOrderConfig {
    pub expiry_window: Duration,
    pub idle_timeout: Option<Duration>,
    pub mailbox_capacity: usize,
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for TableOrderConfig {
    fn default() -> Self {
        Self {
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            idle_timeout: Some(Duration::from_secs(600)),
            mailbox_capacity: 32,
            state_dir: None,
        }
    }
}

impl TableOrderConfig {
    /// Loads configuration from the process environment. Unset variables
    /// take their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let expiry_secs = parse_u64(&lookup, "TABLE_EXPIRY_SECS")?;
        if expiry_secs == Some(0) {
            return Err(ConfigError::Invalid {
                var: "TABLE_EXPIRY_SECS",
                value: "0".to_string(),
                reason: "the expiry window must be positive".to_string(),
            });
        }
        let idle_secs = parse_u64(&lookup, "ACTOR_IDLE_SECS")?;
        let mailbox_capacity = parse_u64(&lookup, "ACTOR_MAILBOX_CAPACITY")?;
        if mailbox_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                var: "ACTOR_MAILBOX_CAPACITY",
                value: "0".to_string(),
                reason: "mailboxes need room for at least one request".to_string(),
            });
        }

        Ok(Self {
            expiry_window: expiry_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiry_window),
            idle_timeout: match idle_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.idle_timeout,
            },
            mailbox_capacity: match mailbox_capacity {
                Some(n) => usize::try_from(n).map_err(|e| ConfigError::Invalid {
                    var: "ACTOR_MAILBOX_CAPACITY",
                    value: n.to_string(),
                    reason: e.to_string(),
                })?,
                None => defaults.mailbox_capacity,
            },
            state_dir: lookup("TABLE_STATE_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        })
}
