//! Visitor feedback submission types
//!
//! Submission itself goes through [`crate::transport::HttpClient::submit_feedback`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Byte limits, counted the way the server counts them
const MIN_MESSAGE_BYTES: usize = 5;
const MAX_MESSAGE_BYTES: usize = 1000;
const MAX_NAME_BYTES: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("{0}")]
    Invalid(String),
    #[error("feedback rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("feedback request failed: {0}")]
    Transport(String),
}

/// Body of `POST /feedback`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl FeedbackRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Check the limits the server enforces, so obvious mistakes never leave
    /// the client.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        let len = self.message.len();
        if len < MIN_MESSAGE_BYTES {
            return Err(FeedbackError::Invalid(format!(
                "message must be at least {MIN_MESSAGE_BYTES} characters"
            )));
        }
        if len > MAX_MESSAGE_BYTES {
            return Err(FeedbackError::Invalid(format!(
                "message must be less than {MAX_MESSAGE_BYTES} characters"
            )));
        }
        if let Some(name) = &self.name {
            if name.len() > MAX_NAME_BYTES {
                return Err(FeedbackError::Invalid(format!(
                    "name must be less than {MAX_NAME_BYTES} characters"
                )));
            }
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !email.contains('@') {
                return Err(FeedbackError::Invalid("email is not valid".to_string()));
            }
        }
        Ok(())
    }
}

/// Success body of `POST /feedback`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub id: Option<String>,
}
