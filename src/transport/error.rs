//! Transport and action error types

use thiserror::Error;

/// Transport failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP error! status: {status}")
        } else {
            format!("HTTP error! status: {status}: {}", body.trim())
        };
        Self::new(TransportErrorKind::Status(status), message)
    }

    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Interrupted, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, timeout before headers
    Connect,
    /// Response arrived with a non-success status
    Status(u16),
    /// Body stream failed after the response started
    Interrupted,
}

impl TransportErrorKind {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Nothing in the client retries automatically; this only feeds logs.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect | Self::Interrupted => true,
            Self::Status(code) => *code == 429 || *code >= 500,
        }
    }
}

/// Failure running a confirmed action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("action request failed: {0}")]
    Transport(String),
    #[error("action rejected with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unsupported action: {0}")]
    Unsupported(String),
    #[error("invalid action response: {0}")]
    InvalidResponse(String),
}

impl ActionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unsupported(_) | Self::InvalidResponse(_) => false,
        }
    }
}
