//! Trait abstractions for network I/O
//!
//! The conversation machine only talks to the network through these traits,
//! so tests can drive it with scripted transports.

mod error;
mod http;

#[cfg(test)]
pub mod testing;

pub use error::{ActionError, TransportError, TransportErrorKind};
pub use http::HttpClient;

use crate::protocol::{ChatRequest, CreateMeetingResponse, ToolProposal};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Response body of a chat exchange, delivered chunk by chunk.
///
/// Dropping the stream releases the underlying exchange.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Capability to open a streaming chat exchange
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issue one chat request and return its body once headers arrive.
    ///
    /// Connection failures and non-success statuses are errors.
    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

/// Executes confirmed tool proposals
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, proposal: &ToolProposal) -> Result<CreateMeetingResponse, ActionError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        (**self).open_chat(request).await
    }
}

#[async_trait]
impl<T: ActionExecutor + ?Sized> ActionExecutor for Arc<T> {
    async fn execute(&self, proposal: &ToolProposal) -> Result<CreateMeetingResponse, ActionError> {
        (**self).execute(proposal).await
    }
}
