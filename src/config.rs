//! Client configuration read from the environment

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_STREAM_BUFFER: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Configuration for the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash
    pub api_base: String,
    /// Correlator sent with every chat request
    pub session_id: Option<String>,
    pub request_timeout: Duration,
    /// Capacity of the channel between the stream reader and the consumer
    pub stream_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            session_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests use a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("AGENT_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(
                || DEFAULT_API_BASE.to_string(),
                |v| v.trim().trim_end_matches('/').to_string(),
            );

        let session_id = lookup("AGENT_SESSION_ID").filter(|v| !v.trim().is_empty());

        let request_timeout = match positive_number(&lookup, "AGENT_REQUEST_TIMEOUT_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let stream_buffer = match positive_number(&lookup, "AGENT_STREAM_BUFFER")? {
            Some(n) => usize::try_from(n).map_err(|_| ConfigError::InvalidNumber {
                var: "AGENT_STREAM_BUFFER",
                value: n.to_string(),
            })?,
            None => DEFAULT_STREAM_BUFFER,
        };

        Ok(Self {
            api_base,
            session_id,
            request_timeout,
            stream_buffer,
        })
    }
}

fn positive_number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
