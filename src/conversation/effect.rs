//! Effects produced by state transitions

use crate::protocol::{Role, ToolProposal};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a complete message to the log
    AppendMessage { role: Role, content: String },

    /// Append the empty assistant entry that streamed text will fill
    AppendPlaceholder,

    /// Add streamed text to the in-progress assistant message
    AppendStreamText { content: String },

    /// Overwrite the in-progress assistant message
    ReplaceAssistantContent { content: String },

    /// Open a streaming session carrying the current history
    OpenStream,

    /// Close the active streaming session, if any
    StopStream,

    /// Run a confirmed proposal through the action executor
    ExecuteAction { proposal: ToolProposal },

    /// Empty the message log and forget the session correlator
    ClearLog,
}

impl Effect {
    pub fn assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}
