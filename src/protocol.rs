//! Wire types shared by the chat stream, actions and feedback endpoints

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One history entry as sent to `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

// ============================================================================
// Frames - decoded units of server output
// ============================================================================

/// A server-declared candidate action awaiting user confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolProposal {
    pub name: String,
    pub args: Value,
}

impl ToolProposal {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Typed view of the arguments when this is a meeting proposal
    pub fn meeting_args(&self) -> Option<CreateMeetingArgs> {
        if self.name != CREATE_MEETING_TOOL {
            return None;
        }
        serde_json::from_value(self.args.clone()).ok()
    }
}

/// One decoded, typed unit of server output
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    ToolCall(ToolProposal),
    Guardrail(Option<String>),
    Error(Option<String>),
    /// Handshake; never yielded by the decoder and ignored by consumers
    Connected,
}

// ============================================================================
// Actions
// ============================================================================

/// Tool name the server uses for meeting proposals
pub const CREATE_MEETING_TOOL: &str = "create_meeting";

/// Arguments of a `create_meeting` proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingArgs {
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    pub attendee_email: String,
}

impl CreateMeetingArgs {
    fn start(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.start_iso).ok()
    }

    fn end(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.end_iso).ok()
    }

    /// Human readable duration, `None` if either timestamp fails to parse
    pub fn duration_label(&self) -> Option<String> {
        let minutes = (self.end()? - self.start()?).num_minutes();
        Some(format_duration(minutes))
    }

    /// Multi-line summary for confirmation prompts
    pub fn summary(&self) -> String {
        let when = self.start().map_or_else(
            || self.start_iso.clone(),
            |start| start.format("%A, %B %-d, %Y %H:%M %:z").to_string(),
        );
        let duration = self
            .duration_label()
            .unwrap_or_else(|| "unknown duration".to_string());
        format!(
            "Title: {}\nDate & Time: {when}\nDuration: {duration}\nAttendee: {}",
            self.title, self.attendee_email
        )
    }
}

fn format_duration(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{hours}h {rest}m")
    } else if hours > 1 {
        format!("{hours} hours")
    } else {
        format!("{hours} hour")
    }
}

/// Success body of `POST /actions/create-meeting`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    pub status: String,
    pub event_id: String,
    pub html_link: String,
}

/// Standard error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
}
