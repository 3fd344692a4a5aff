//! Conversation driver
//!
//! Owns the state, the message log and the single active streaming session,
//! runs events through [`transition`] and executes the resulting effects.

use super::log::{Message, MessageLog};
use super::transition::{transition, TransitionError, TurnContext};
use super::{ConvState, Effect, Event};
use crate::config::ClientConfig;
use crate::protocol::{ChatRequest, Frame, Role, ToolProposal};
use crate::stream::StreamingSession;
use crate::transport::{ActionExecutor, ChatTransport};
use std::collections::VecDeque;

/// Identifies one opened stream within a conversation
pub type StreamId = u64;

/// What a single applied frame changed; returned at each commit point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Text appended to the in-progress assistant message
    Text { delta: String },
    /// A proposal is waiting for confirmation
    ToolProposal,
    /// The request was refused as out of scope
    Guardrail,
    /// The server reported an error
    Error,
    /// The transport failed
    Failed,
    /// The stream closed normally
    Ended,
}

#[derive(Debug)]
struct ActiveStream {
    id: StreamId,
    session: StreamingSession,
    awaiting_first_text: bool,
}

/// One conversation, explicitly constructed and owned by the caller
pub struct ConversationMachine<T, A>
where
    T: ChatTransport,
    A: ActionExecutor,
{
    transport: T,
    actions: A,
    session_id: Option<String>,
    stream_buffer: usize,
    state: ConvState,
    log: MessageLog,
    active: Option<ActiveStream>,
    next_stream_id: StreamId,
}

impl<T, A> ConversationMachine<T, A>
where
    T: ChatTransport,
    A: ActionExecutor,
{
    pub fn new(transport: T, actions: A, config: &ClientConfig) -> Self {
        Self {
            transport,
            actions,
            session_id: config.session_id.clone(),
            stream_buffer: config.stream_buffer,
            state: ConvState::Idle,
            log: MessageLog::new(),
            active: None,
            next_stream_id: 1,
        }
    }

    // ==================== Rendering accessors ====================

    pub fn state(&self) -> &ConvState {
        &self.state
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn snapshot(&self) -> &[Message] {
        self.log.snapshot()
    }

    pub fn tool_proposal(&self) -> Option<&ToolProposal> {
        self.state.tool_proposal()
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// True until the first non-empty text of the active stream arrives
    pub fn is_awaiting_first_text(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.awaiting_first_text)
    }

    pub fn active_stream_id(&self) -> Option<StreamId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    // ==================== User operations ====================

    /// Submit a user message and open a stream for the answer.
    ///
    /// Transport failures become an assistant message, not an error.
    /// Dropping the future while connecting leaves the turn stopped with an
    /// empty answer, the same as [`Self::stop`] before any text arrived.
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<(), TransitionError> {
        let deferred = self.dispatch(Event::UserMessage { text: text.into() })?;
        self.run_deferred(deferred).await;
        Ok(())
    }

    /// Wait for the next frame of the active stream and apply it.
    ///
    /// Returns after exactly one applied frame so the caller can render
    /// before more input is read; `None` when no stream is active.
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            let active = self.active.as_mut()?;
            let id = active.id;
            let item = active.session.next().await;
            let update = match item {
                Some(Ok(frame)) => self.apply_frame(id, frame),
                Some(Err(error)) => self.apply_stream_event(id, Event::TransportFailed { error }),
                None => self.apply_stream_event(id, Event::StreamEnded),
            };
            if update.is_some() {
                return update;
            }
        }
    }

    /// Apply one frame from the given stream.
    ///
    /// Frames from a stream that is no longer active are discarded.
    pub fn apply_frame(&mut self, stream: StreamId, frame: Frame) -> Option<Update> {
        let event = Event::from_frame(frame)?;
        self.apply_stream_event(stream, event)
    }

    /// Stop the active stream, keeping the text received so far
    pub fn stop(&mut self) {
        if let Err(e) = self.dispatch(Event::UserStop) {
            tracing::warn!(error = %e, "Stop rejected");
        }
    }

    /// Execute the pending proposal and report the outcome in the log.
    ///
    /// Dropping the future before the outcome arrives keeps the proposal
    /// pending.
    pub async fn confirm(&mut self) -> Result<(), TransitionError> {
        let deferred = self.dispatch(Event::UserConfirm)?;
        self.run_deferred(deferred).await;
        Ok(())
    }

    pub fn cancel_proposal(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::UserCancelProposal).map(|_| ())
    }

    /// Reset to an empty, idle conversation
    pub fn clear(&mut self) {
        if let Err(e) = self.dispatch(Event::Clear) {
            tracing::warn!(error = %e, "Clear rejected");
        }
    }

    // ==================== Internals ====================

    fn apply_stream_event(&mut self, stream: StreamId, event: Event) -> Option<Update> {
        if self.active_stream_id() != Some(stream) {
            tracing::debug!(stream_id = stream, "Discarding event from inactive stream");
            return None;
        }

        let update = match &event {
            Event::StreamText { content } => Update::Text {
                delta: content.clone(),
            },
            Event::StreamToolCall { .. } => Update::ToolProposal,
            Event::StreamGuardrail { .. } => Update::Guardrail,
            Event::StreamError { .. } => Update::Error,
            Event::TransportFailed { .. } => Update::Failed,
            _ => Update::Ended,
        };

        match self.dispatch(event) {
            Ok(_) => Some(update),
            Err(e) => {
                tracing::warn!(stream_id = stream, error = %e, "Stream event rejected");
                None
            }
        }
    }

    /// Run one transition, apply its immediate effects and return the ones
    /// that need I/O.
    fn dispatch(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let context = TurnContext {
            stream_active: self.active.is_some(),
        };
        self.dispatch_in(&context, event)
    }

    fn dispatch_in(
        &mut self,
        context: &TurnContext,
        event: Event,
    ) -> Result<Vec<Effect>, TransitionError> {
        let result = transition(&self.state, context, event)?;

        if result.new_state.name() != self.state.name() {
            tracing::debug!(
                from = self.state.name(),
                to = result.new_state.name(),
                "State transition"
            );
        }
        self.state = result.new_state;

        let mut deferred = Vec::new();
        for effect in result.effects {
            match effect {
                Effect::AppendMessage { role, content } => {
                    self.log.append(role, content);
                }
                Effect::AppendPlaceholder => {
                    self.log.append(Role::Assistant, "");
                }
                Effect::AppendStreamText { content } => self.append_stream_text(&content),
                Effect::ReplaceAssistantContent { content } => {
                    self.log.replace_last_assistant_content(content);
                }
                Effect::StopStream => self.stop_stream(),
                Effect::ClearLog => {
                    self.log.clear();
                    self.session_id = None;
                }
                io @ (Effect::OpenStream | Effect::ExecuteAction { .. }) => deferred.push(io),
            }
        }
        Ok(deferred)
    }

    fn append_stream_text(&mut self, content: &str) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !content.is_empty() {
            active.awaiting_first_text = false;
        }
        self.log.append_to_last_assistant(content);
    }

    fn stop_stream(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.session.cancel();
            tracing::debug!(stream_id = active.id, "Stream closed");
        }
    }

    async fn run_deferred(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let follow_up = match effect {
                Effect::OpenStream => self.open_stream().await,
                Effect::ExecuteAction { proposal } => self.execute_action(proposal).await,
                other => {
                    tracing::warn!(effect = ?other, "Unexpected deferred effect");
                    Vec::new()
                }
            };
            queue.extend(follow_up);
        }
    }

    async fn open_stream(&mut self) -> Vec<Effect> {
        let mut messages = self.log.history();
        // The placeholder this stream will fill is not history yet
        if messages
            .last()
            .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
        {
            messages.pop();
        }
        let request = ChatRequest {
            messages,
            session_id: self.session_id.clone(),
        };

        let opened = StreamingSession::open(&self.transport, &request, self.stream_buffer).await;
        match opened {
            Ok(session) => {
                let id = self.next_stream_id;
                self.next_stream_id += 1;
                tracing::info!(
                    stream_id = id,
                    messages = request.messages.len(),
                    "Stream opened"
                );
                self.active = Some(ActiveStream {
                    id,
                    session,
                    awaiting_first_text: true,
                });
                Vec::new()
            }
            Err(error) => {
                tracing::error!(
                    error = %error,
                    retryable = error.kind.is_retryable(),
                    "Failed to open stream"
                );
                // The failed exchange counts as this turn's stream
                self.dispatch_in(&TurnContext::streaming(), Event::TransportFailed { error })
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Transport failure rejected");
                        Vec::new()
                    })
            }
        }
    }

    async fn execute_action(&mut self, proposal: ToolProposal) -> Vec<Effect> {
        let outcome = self.actions.execute(&proposal).await;
        match &outcome {
            Ok(response) => {
                tracing::info!(action = %proposal.name, event_id = %response.event_id, "Action completed");
            }
            Err(e) => {
                tracing::error!(
                    action = %proposal.name,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Action failed"
                );
            }
        }

        self.dispatch(Event::ActionCompleted { outcome })
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Action outcome rejected");
                Vec::new()
            })
    }
}
