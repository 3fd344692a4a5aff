//! Agent chat client
//!
//! Streams answers from a chat service, decodes them into typed frames and
//! drives a conversation state machine that keeps an ordered message log.

pub mod config;
pub mod conversation;
pub mod feedback;
pub mod protocol;
pub mod stream;
pub mod transport;
