//! Conversation state machine
//!
//! Pure transitions in `transition`, I/O and bookkeeping in `machine`.

mod effect;
pub mod event;
mod log;
mod machine;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use log::{Message, MessageLog};
pub use machine::{ConversationMachine, StreamId, Update};
pub use state::ConvState;
pub use transition::{transition, TransitionError, TransitionResult, TurnContext};
