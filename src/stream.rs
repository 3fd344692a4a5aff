//! Incremental response streaming
//!
//! `decoder` turns chunked text into frames; `session` owns the exchange that
//! produces the chunks.

mod decoder;
mod session;


pub use decoder::{decode_line, DecodeError, FrameDecoder, LineOutcome};
pub use session::StreamingSession;
