//! Property-based tests for conversation transitions
//!
//! A tiny model of the driver tracks whether a stream is open from the
//! emitted effects, so sequences exercise the same contexts the real driver
//! would produce.

use super::transition::*;
use super::*;
use crate::protocol::{CreateMeetingResponse, ToolProposal, CREATE_MEETING_TOOL};
use crate::transport::{ActionError, TransportError};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_proposal() -> impl Strategy<Value = ToolProposal> {
    ("[a-z ]{1,20}", prop::bool::ANY).prop_map(|(title, meeting)| {
        let name = if meeting { CREATE_MEETING_TOOL } else { "share_contact" };
        ToolProposal::new(
            name,
            json!({
                "title": title,
                "startIso": "2025-03-01T10:00:00Z",
                "endIso": "2025-03-01T11:00:00Z",
                "attendeeEmail": "guest@example.com"
            }),
        )
    })
}

fn arb_optional_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z ]{0,20}")
}

fn arb_outcome() -> impl Strategy<Value = Result<CreateMeetingResponse, ActionError>> {
    prop_oneof![
        "[a-z]{4}".prop_map(|id| Ok(CreateMeetingResponse {
            status: "confirmed".to_string(),
            event_id: id.clone(),
            html_link: format!("https://cal.example.com/{id}"),
        })),
        Just(Err(ActionError::Status {
            status: 500,
            message: "down".to_string()
        })),
        Just(Err(ActionError::Transport("refused".to_string()))),
    ]
}

fn arb_stream_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|content| Event::StreamText { content }),
        arb_proposal().prop_map(|proposal| Event::StreamToolCall { proposal }),
        arb_optional_text().prop_map(|content| Event::StreamGuardrail { content }),
        arb_optional_text().prop_map(|content| Event::StreamError { content }),
        Just(Event::StreamEnded),
        Just(Event::TransportFailed {
            error: TransportError::interrupted("reset")
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserMessage { text }),
        Just(Event::UserStop),
        Just(Event::UserConfirm),
        Just(Event::UserCancelProposal),
        Just(Event::Clear),
        arb_outcome().prop_map(|outcome| Event::ActionCompleted { outcome }),
        arb_stream_event(),
        arb_stream_event(),
    ]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        Just(ConvState::Chatting),
        Just(ConvState::Guardrail),
        arb_proposal().prop_map(|proposal| ConvState::ToolProposal { proposal }),
    ]
}

// ============================================================================
// Driver model
// ============================================================================

/// Stream flag after applying effects, as the driver would
fn stream_after(mut active: bool, effects: &[Effect]) -> bool {
    for effect in effects {
        match effect {
            Effect::OpenStream => active = true,
            Effect::StopStream => active = false,
            _ => {}
        }
    }
    active
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // An open stream only ever exists while chatting
    #[test]
    fn prop_stream_only_while_chatting(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::Idle;
        let mut active = false;

        for event in events {
            let context = TurnContext { stream_active: active };
            if let Ok(result) = transition(&state, &context, event) {
                active = stream_after(active, &result.effects);
                state = result.new_state;
                if active {
                    prop_assert_eq!(&state, &ConvState::Chatting);
                }
            }
        }
    }

    // Stream events are accepted exactly when chatting with an open stream
    #[test]
    fn prop_stream_events_need_open_stream(
        state in arb_state(),
        active in prop::bool::ANY,
        event in arb_stream_event()
    ) {
        let accepted = transition(&state, &TurnContext { stream_active: active }, event).is_ok();
        prop_assert_eq!(accepted, active && state == ConvState::Chatting);
    }

    // Every accepted stream event other than text closes the stream
    #[test]
    fn prop_terminal_stream_events_stop(event in arb_stream_event()) {
        let is_text = matches!(event, Event::StreamText { .. });
        let result = transition(&ConvState::Chatting, &TurnContext::streaming(), event).unwrap();
        prop_assert_eq!(result.effects.contains(&Effect::StopStream), !is_text);
        prop_assert!(!result.effects.contains(&Effect::OpenStream));
    }

    // Messages are rejected while a stream is open, in any state
    #[test]
    fn prop_busy_rejects_messages(state in arb_state(), text in "[a-zA-Z ]{0,20}") {
        let result = transition(&state, &TurnContext::streaming(), Event::UserMessage { text });
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    // An accepted message always starts exactly one stream
    #[test]
    fn prop_message_opens_one_stream(state in arb_state(), text in "[a-zA-Z]{1,20}") {
        match transition(&state, &TurnContext::default(), Event::UserMessage { text: text.clone() }) {
            Ok(result) => {
                prop_assert_eq!(result.new_state, ConvState::Chatting);
                prop_assert_eq!(
                    result.effects,
                    vec![Effect::user_message(text), Effect::AppendPlaceholder, Effect::OpenStream]
                );
            }
            Err(e) => {
                prop_assert!(state.tool_proposal().is_some());
                prop_assert_eq!(e, TransitionError::ProposalPending);
            }
        }
    }

    // Clear is accepted from anywhere and forgets everything
    #[test]
    fn prop_clear_always_idles(state in arb_state(), active in prop::bool::ANY) {
        let result = transition(&state, &TurnContext { stream_active: active }, Event::Clear).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert_eq!(result.effects, vec![Effect::StopStream, Effect::ClearLog]);
    }

    // Resolving a proposal always leaves it behind
    #[test]
    fn prop_outcome_resolves_proposal(proposal in arb_proposal(), outcome in arb_outcome()) {
        let state = ConvState::ToolProposal { proposal };
        let result = transition(&state, &TurnContext::default(), Event::ActionCompleted { outcome }).unwrap();
        prop_assert!(result.new_state.tool_proposal().is_none());
        prop_assert_eq!(result.effects.len(), 1);
    }

    // Same inputs, same outputs
    #[test]
    fn prop_transition_is_deterministic(
        state in arb_state(),
        active in prop::bool::ANY,
        event in arb_event()
    ) {
        let context = TurnContext { stream_active: active };
        let first = transition(&state, &context, event.clone());
        let second = transition(&state, &context, event);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_state, b.new_state);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }
}
