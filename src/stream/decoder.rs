//! Incremental decoder for the `data: ` line protocol
//!
//! Lines are split on raw `\n` bytes before UTF-8 decoding, so a multi-byte
//! character split across chunks still decodes correctly.

use crate::protocol::{Frame, ToolProposal};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Why a single data line was skipped
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tool_call record without a tool")]
    MissingTool,
}

/// Outcome of decoding one complete line
#[derive(Debug)]
pub enum LineOutcome {
    Frame(Frame),
    /// Not a data line, or a filtered record
    Ignored,
    Done,
    Malformed(DecodeError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Text {
        #[serde(default)]
        content: Option<String>,
    },
    ToolCall {
        #[serde(default)]
        tool: Option<WireTool>,
    },
    Guardrail {
        #[serde(default)]
        content: Option<String>,
    },
    Error {
        #[serde(default)]
        content: Option<String>,
    },
    Connected,
}

#[derive(Debug, Deserialize)]
struct WireTool {
    name: String,
    #[serde(default)]
    parameters: Value,
}

fn non_empty(content: Option<String>) -> Option<String> {
    content.filter(|c| !c.is_empty())
}

/// Decode one complete line (without its terminator)
pub fn decode_line(line: &str) -> LineOutcome {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Ignored;
    };
    if payload == DONE_SENTINEL {
        return LineOutcome::Done;
    }

    let event = match serde_json::from_str::<WireEvent>(payload) {
        Ok(event) => event,
        Err(e) => return LineOutcome::Malformed(e.into()),
    };

    match event {
        WireEvent::Text { content } => LineOutcome::Frame(Frame::Text(content.unwrap_or_default())),
        WireEvent::ToolCall { tool: Some(tool) } => {
            LineOutcome::Frame(Frame::ToolCall(ToolProposal::new(tool.name, tool.parameters)))
        }
        WireEvent::ToolCall { tool: None } => LineOutcome::Malformed(DecodeError::MissingTool),
        WireEvent::Guardrail { content } => LineOutcome::Frame(Frame::Guardrail(non_empty(content))),
        WireEvent::Error { content } => LineOutcome::Frame(Frame::Error(non_empty(content))),
        WireEvent::Connected => LineOutcome::Ignored,
    }
}

/// Stateful decoder, one per streaming session
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel has been seen; later chunks yield nothing
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and return every frame it completes, in order
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Frame> {
        let chunk = chunk.as_ref();
        let mut frames = Vec::new();
        if self.done || chunk.is_empty() {
            return frames;
        }

        self.carry.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.carry[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let raw = &self.carry[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw).into_owned();
            start = end + 1;

            match decode_line(&line) {
                LineOutcome::Frame(frame) => frames.push(frame),
                LineOutcome::Ignored => {}
                LineOutcome::Done => {
                    self.done = true;
                    self.carry.clear();
                    return frames;
                }
                LineOutcome::Malformed(e) => {
                    tracing::warn!(error = %e, payload = %line, "Skipping malformed stream line");
                }
            }
        }

        self.carry.drain(..start);
        frames
    }

    /// End of input; an unterminated trailing line is discarded
    pub fn finish(&mut self) {
        if !self.carry.is_empty() {
            tracing::debug!(
                bytes = self.carry.len(),
                "Discarding unterminated trailing line"
            );
            self.carry.clear();
        }
        self.done = true;
    }
}
