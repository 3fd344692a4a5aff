//! One request/response exchange exposed as a cancellable frame sequence
//!
//! A producer task reads the transport body, decodes it and forwards frames
//! over a bounded channel. Cancelling stops the producer, which drops the
//! body and closes the channel.

use super::decoder::FrameDecoder;
use crate::protocol::{ChatRequest, Frame};
use crate::transport::{ByteStream, ChatTransport, TransportError};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type Item = Result<Frame, TransportError>;

/// A live streaming exchange
#[derive(Debug)]
pub struct StreamingSession {
    frames: mpsc::Receiver<Item>,
    cancel: CancellationToken,
    finished: bool,
}

impl StreamingSession {
    /// Issue one chat request and start decoding its body.
    ///
    /// Fails if the transport rejects the connection or the status is not
    /// successful; no frames are produced in that case.
    pub async fn open<T>(
        transport: &T,
        request: &ChatRequest,
        buffer: usize,
    ) -> Result<Self, TransportError>
    where
        T: ChatTransport + ?Sized,
    {
        let body = transport.open_chat(request).await?;
        Ok(Self::from_body(body, buffer))
    }

    /// Start decoding an already-open body
    pub fn from_body(body: ByteStream, buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        tokio::spawn(pump(body, tx, cancel.clone()));
        Self {
            frames: rx,
            cancel,
            finished: false,
        }
    }

    /// Next frame, or `None` once the stream ended or was cancelled.
    ///
    /// A transport failure mid-body is yielded once and ends the sequence.
    pub async fn next(&mut self) -> Option<Item> {
        if self.finished || self.cancel.is_cancelled() {
            return None;
        }
        match self.frames.recv().await {
            Some(Ok(frame)) => Some(Ok(frame)),
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Stop the exchange. Buffered frames are discarded. Idempotent.
    pub fn cancel(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Cancelling streaming session");
            self.cancel.cancel();
        }
        self.frames.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Forward one item unless cancelled first; false means stop producing
async fn forward(tx: &mpsc::Sender<Item>, cancel: &CancellationToken, item: Item) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

async fn pump(mut body: ByteStream, tx: mpsc::Sender<Item>, cancel: CancellationToken) {
    let mut decoder = FrameDecoder::new();

    loop {
        let chunk = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Stream reader stopped by cancellation");
                return;
            }
            () = tx.closed() => return,
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for frame in decoder.push(&bytes) {
                    if !forward(&tx, &cancel, Ok(frame)).await {
                        return;
                    }
                }
                if decoder.is_done() {
                    tracing::debug!("Stream finished with sentinel");
                    return;
                }
            }
            Some(Err(e)) => {
                tracing::error!(
                    error = %e,
                    retryable = e.kind.is_retryable(),
                    "Stream body failed"
                );
                forward(&tx, &cancel, Err(e)).await;
                return;
            }
            None => {
                decoder.finish();
                tracing::debug!("Stream body closed");
                return;
            }
        }
    }
}
