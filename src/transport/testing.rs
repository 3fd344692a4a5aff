//! Mock transports for testing
//!
//! These mocks let sessions and the conversation machine run without real I/O.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use super::{ActionError, ActionExecutor, ByteStream, ChatTransport, TransportError};
use crate::protocol::{ChatRequest, CreateMeetingResponse, ToolProposal};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// ============================================================================
// Scripted chat transport
// ============================================================================

/// What the next `open_chat` call produces
pub enum Script {
    /// Body delivered as the given chunks, then closed
    Body(Vec<Result<Vec<u8>, TransportError>>),
    /// Connection-level failure
    Fail(TransportError),
    /// Body fed by the test through a [`LiveBody`]
    Live(mpsc::Receiver<Result<Vec<u8>, TransportError>>),
    /// Connection that never answers
    Hang,
}

/// Test-side handle for a live body
pub struct LiveBody {
    tx: mpsc::Sender<Result<Vec<u8>, TransportError>>,
}

impl LiveBody {
    /// Create a handle and the script to queue on the transport
    pub fn new() -> (Self, Script) {
        let (tx, rx) = mpsc::channel(64);
        (Self { tx }, Script::Live(rx))
    }

    /// Push one chunk; false once the reader has released the body
    pub async fn send(&self, chunk: &str) -> bool {
        self.tx.send(Ok(chunk.as_bytes().to_vec())).await.is_ok()
    }

    pub async fn fail(&self, error: TransportError) -> bool {
        self.tx.send(Err(error)).await.is_ok()
    }

    /// True once the reading side dropped the body stream
    pub fn is_released(&self) -> bool {
        self.tx.is_closed()
    }

    /// Wait until the reading side dropped the body stream
    pub async fn released(&self) {
        self.tx.closed().await;
    }
}

/// Transport that replays queued scripts, one per request
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    /// Queue a body made of the given text chunks
    pub fn queue_chunks(&self, chunks: &[&str]) {
        let body = chunks
            .iter()
            .map(|c| Ok(c.as_bytes().to_vec()))
            .collect();
        self.queue(Script::Body(body));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Fail(TransportError::connect("No mock body queued")));

        match script {
            Script::Body(chunks) => Ok(futures::stream::iter(chunks).boxed()),
            Script::Fail(e) => Err(e),
            Script::Live(rx) => Ok(ReceiverStream::new(rx).boxed()),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Build one `data: ` line with a trailing blank line
pub fn data_line(payload: &serde_json::Value) -> String {
    format!("data: {payload}\n\n")
}

pub fn text_line(content: &str) -> String {
    data_line(&serde_json::json!({"role": "assistant", "type": "text", "content": content}))
}

// ============================================================================
// Mock action executor
// ============================================================================

/// Action executor that returns queued outcomes
pub struct MockActionExecutor {
    outcomes: Mutex<VecDeque<Result<CreateMeetingResponse, ActionError>>>,
    /// Record of all executed proposals
    pub executed: Mutex<Vec<ToolProposal>>,
}

impl MockActionExecutor {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_success(&self, html_link: &str) {
        self.outcomes.lock().unwrap().push_back(Ok(CreateMeetingResponse {
            status: "confirmed".to_string(),
            event_id: "evt-1".to_string(),
            html_link: html_link.to_string(),
        }));
    }

    pub fn queue_error(&self, error: ActionError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_proposals(&self) -> Vec<ToolProposal> {
        self.executed.lock().unwrap().clone()
    }
}

impl Default for MockActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionExecutor for MockActionExecutor {
    async fn execute(&self, proposal: &ToolProposal) -> Result<CreateMeetingResponse, ActionError> {
        self.executed.lock().unwrap().push(proposal.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ActionError::Transport("No mock outcome queued".to_string())))
    }
}
