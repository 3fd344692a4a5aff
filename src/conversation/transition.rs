//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects; all I/O happens in the driver.

use super::{ConvState, Effect, Event};
use crate::protocol::{CreateMeetingResponse, ToolProposal};
use crate::transport::ActionError;
use thiserror::Error;

pub const ERROR_FALLBACK: &str = "An error occurred";
pub const TRANSPORT_FALLBACK: &str = "Sorry, there was an error processing your request.";
pub const CANCEL_ACK: &str =
    "No problem! The meeting has been cancelled. Is there anything else I can help you with?";
pub const MEETING_FAILURE: &str =
    "Sorry, there was an error creating the meeting. Please try again or get in touch directly.";
pub const ACTION_FAILURE: &str = "Sorry, that action could not be completed. Please try again.";

/// Facts about the driver the transition depends on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnContext {
    /// A streaming session is currently open
    pub stream_active: bool,
}

impl TurnContext {
    pub fn streaming() -> Self {
        Self {
            stream_active: true,
        }
    }
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A response is still streaming, wait or stop it first")]
    Busy,
    #[error("Confirm or cancel the pending action first")]
    ProposalPending,
    #[error("There is no pending action")]
    NoProposal,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User messages
        // ============================================================
        (_, Event::UserMessage { .. }) if context.stream_active => Err(TransitionError::Busy),

        (ConvState::ToolProposal { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::ProposalPending)
        }

        (_, Event::UserMessage { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        // Idle, Chatting and Guardrail all start a new turn
        (_, Event::UserMessage { text }) => Ok(TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::user_message(text))
            .with_effect(Effect::AppendPlaceholder)
            .with_effect(Effect::OpenStream)),

        (_, Event::UserStop) if context.stream_active => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::StopStream))
        }

        (_, Event::UserStop) => Ok(TransitionResult::new(state.clone())),

        (_, Event::Clear) => Ok(TransitionResult::new(ConvState::Idle)
            .with_effect(Effect::StopStream)
            .with_effect(Effect::ClearLog)),

        // ============================================================
        // Stream frames (only while chatting with an open stream)
        // ============================================================
        (ConvState::Chatting, event) if context.stream_active && event.is_stream_event() => {
            Ok(apply_stream_event(event))
        }

        (state, event) if event.is_stream_event() => Err(TransitionError::InvalidTransition(
            format!(
                "stream event in state {} (stream active: {})",
                state.name(),
                context.stream_active
            ),
        )),

        // ============================================================
        // Proposals
        // ============================================================
        (ConvState::ToolProposal { proposal }, Event::UserConfirm) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ExecuteAction {
                proposal: proposal.clone(),
            }))
        }

        (ConvState::ToolProposal { .. }, Event::UserCancelProposal) => {
            Ok(TransitionResult::new(ConvState::Chatting)
                .with_effect(Effect::assistant_message(CANCEL_ACK)))
        }

        (ConvState::ToolProposal { proposal }, Event::ActionCompleted { outcome }) => {
            let message = action_message(proposal, &outcome);
            Ok(TransitionResult::new(ConvState::Chatting)
                .with_effect(Effect::assistant_message(message)))
        }

        (_, Event::UserConfirm | Event::UserCancelProposal) => Err(TransitionError::NoProposal),

        (state, Event::ActionCompleted { .. }) => Err(TransitionError::InvalidTransition(
            format!("action completed in state {}", state.name()),
        )),

        (_, event) => Err(TransitionError::InvalidTransition(format!("{event:?}"))),
    }
}

fn apply_stream_event(event: Event) -> TransitionResult {
    match event {
        Event::StreamText { content } => TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::AppendStreamText { content }),

        Event::StreamToolCall { proposal } => {
            TransitionResult::new(ConvState::ToolProposal { proposal })
                .with_effect(Effect::StopStream)
        }

        Event::StreamGuardrail { content } => TransitionResult::new(ConvState::Guardrail)
            .with_effect(Effect::ReplaceAssistantContent {
                content: content.unwrap_or_default(),
            })
            .with_effect(Effect::StopStream),

        Event::StreamError { content } => TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::ReplaceAssistantContent {
                content: content.unwrap_or_else(|| ERROR_FALLBACK.to_string()),
            })
            .with_effect(Effect::StopStream),

        Event::TransportFailed { .. } => TransitionResult::new(ConvState::Chatting)
            .with_effect(Effect::ReplaceAssistantContent {
                content: TRANSPORT_FALLBACK.to_string(),
            })
            .with_effect(Effect::StopStream),

        // StreamEnded; accumulated text stays as the final answer
        _ => TransitionResult::new(ConvState::Chatting).with_effect(Effect::StopStream),
    }
}

/// Assistant message reporting an action outcome
pub fn action_message(
    proposal: &ToolProposal,
    outcome: &Result<CreateMeetingResponse, ActionError>,
) -> String {
    let meeting = proposal.meeting_args();
    match (outcome, meeting) {
        (Ok(response), Some(args)) => format!(
            "Great! I've scheduled the meeting \"{}\" for you. You should receive a calendar invitation at {}. You can view the event details here: {}",
            args.title, args.attendee_email, response.html_link
        ),
        (Ok(response), None) => format!(
            "Done! The action completed. You can view the details here: {}",
            response.html_link
        ),
        (Err(_), Some(_)) => MEETING_FAILURE.to_string(),
        (Err(_), None) => ACTION_FAILURE.to_string(),
    }
}
