//! Events that can occur in a conversation

use crate::protocol::{CreateMeetingResponse, Frame, ToolProposal};
use crate::transport::{ActionError, TransportError};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },
    /// Stop the active stream, keeping what arrived so far
    UserStop,
    UserConfirm,
    UserCancelProposal,
    Clear,

    // Stream events
    StreamText {
        content: String,
    },
    StreamToolCall {
        proposal: ToolProposal,
    },
    StreamGuardrail {
        content: Option<String>,
    },
    StreamError {
        content: Option<String>,
    },
    StreamEnded,
    TransportFailed {
        error: TransportError,
    },

    // Action events
    ActionCompleted {
        outcome: Result<CreateMeetingResponse, ActionError>,
    },
}

impl Event {
    /// Map a decoded frame to its event; `Connected` has none
    pub fn from_frame(frame: Frame) -> Option<Self> {
        match frame {
            Frame::Text(content) => Some(Event::StreamText { content }),
            Frame::ToolCall(proposal) => Some(Event::StreamToolCall { proposal }),
            Frame::Guardrail(content) => Some(Event::StreamGuardrail { content }),
            Frame::Error(content) => Some(Event::StreamError { content }),
            Frame::Connected => None,
        }
    }

    /// Whether this event originates from the response stream
    pub fn is_stream_event(&self) -> bool {
        matches!(
            self,
            Event::StreamText { .. }
                | Event::StreamToolCall { .. }
                | Event::StreamGuardrail { .. }
                | Event::StreamError { .. }
                | Event::StreamEnded
                | Event::TransportFailed { .. }
        )
    }
}
