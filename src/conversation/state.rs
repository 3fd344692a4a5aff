//! Conversation state types

use crate::protocol::ToolProposal;
use serde::{Deserialize, Serialize};

/// Conversation state
///
/// A proposal is carried by the `ToolProposal` variant, so one exists exactly
/// while the conversation is waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConvState {
    /// No message exchanged yet
    #[default]
    Idle,

    /// Normal turn-taking; a stream may or may not be active
    Chatting,

    /// Server proposed an action, waiting for confirm or cancel
    ToolProposal { proposal: ToolProposal },

    /// Server refused the last request as out of scope
    Guardrail,
}

impl ConvState {
    /// Stable name for rendering layers
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Chatting => "chatting",
            ConvState::ToolProposal { .. } => "tool-proposal",
            ConvState::Guardrail => "guardrail",
        }
    }

    pub fn tool_proposal(&self) -> Option<&ToolProposal> {
        match self {
            ConvState::ToolProposal { proposal } => Some(proposal),
            _ => None,
        }
    }
}
