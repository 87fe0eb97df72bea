//! Per-connection lifecycle: read loop, dispatch, response writing.
//!
//! Each accepted socket gets one [`ConnectionHandler`] running an explicit
//! state machine:
//!
//! ```text
//! AwaitingFrame ──► Evaluating ──► Responding ──┐
//!       ▲                                       │
//!       └───────────────────────────────────────┘
//! ```
//!
//! with a terminal `Closed` state reachable from any point on I/O error,
//! framing violation, or client disconnect. A connection is never resumed
//! after it closes.
//!
//! Evaluation runs on the blocking thread pool with the shared engine locked
//! for the duration of the call. The writer task keeps draining AsyncOutput
//! frames while the engine blocks, so output produced mid-evaluation reaches
//! the socket before the evaluation's Response frame.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::task;
use tracing::{debug, trace};

use crate::engine::ScriptEngine;
use crate::error::{ReplwireError, Result};
use crate::protocol::{FrameBuffer, Message, Tag, DEFAULT_MAX_FRAME_SIZE};
use crate::relay::OutputRelay;
use crate::writer::{spawn_writer_task, OutboundFrame, WriterHandle};

/// Read buffer size for the read loop.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    /// Reading bytes until a complete request frame is decoded.
    AwaitingFrame,
    /// The engine is evaluating a request; output frames may be in flight.
    Evaluating,
    /// Writing the Response frame for the finished evaluation.
    Responding,
    /// Terminal; the socket is gone.
    Closed,
}

fn transition(state: &mut ConnState, next: ConnState) {
    trace!(from = ?state, to = ?next, "connection state");
    *state = next;
}

/// Handles one client connection against a shared engine.
pub struct ConnectionHandler<E> {
    engine: Arc<Mutex<E>>,
    max_frame_size: usize,
}

impl<E: ScriptEngine> ConnectionHandler<E> {
    /// Create a handler over a shared engine instance.
    pub fn new(engine: Arc<Mutex<E>>) -> Self {
        Self {
            engine,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Override the maximum request frame size.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Run the connection to completion.
    ///
    /// Returns `Ok(())` on a clean client disconnect. Any error means the
    /// connection was torn down; the caller decides whether to keep
    /// accepting (errors here never poison the engine or the listener).
    pub async fn run<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, write_half) = tokio::io::split(stream);
        let (writer, writer_task) = spawn_writer_task(write_half);

        let result = self.read_loop(reader, &writer).await;

        // Drop our handle so the writer drains its queue and exits, then
        // surface any write error the loop itself did not observe.
        drop(writer);
        let writer_result = match writer_task.await {
            Ok(r) => r,
            Err(_) => Err(ReplwireError::ConnectionClosed),
        };

        result.and(writer_result)
    }

    async fn read_loop<R>(&self, mut reader: R, writer: &WriterHandle) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut frame_buffer = FrameBuffer::with_max_frame_size(self.max_frame_size);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut state = ConnState::AwaitingFrame;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                // End of stream while awaiting a frame is a normal
                // termination, even with unconsumed buffered bytes.
                transition(&mut state, ConnState::Closed);
                debug!(
                    buffered = frame_buffer.len(),
                    "client disconnected, closing connection"
                );
                return Ok(());
            }

            for message in frame_buffer.push(&buf[..n])? {
                self.handle_request(message, writer, &mut state).await?;
            }
        }
    }

    /// Drive one decoded request frame through evaluate-and-respond.
    async fn handle_request(
        &self,
        message: Message,
        writer: &WriterHandle,
        state: &mut ConnState,
    ) -> Result<()> {
        if message.tag() != Tag::Response {
            return Err(ReplwireError::Framing(
                "client sent an async-output frame".to_string(),
            ));
        }

        let source = message.text()?.to_owned();
        debug!(len = source.len(), "evaluating request");

        transition(state, ConnState::Evaluating);
        let relay = Arc::new(OutputRelay::new(writer.clone()));
        let outcome = {
            let engine = Arc::clone(&self.engine);
            let relay = Arc::clone(&relay);
            task::spawn_blocking(move || {
                let mut engine = engine.lock().unwrap_or_else(|e| e.into_inner());
                engine.evaluate(&source, relay.as_ref())
            })
            .await
            .map_err(|e| ReplwireError::Evaluation(e.to_string()))?
        };

        // A relay failure means output was lost; the connection is no
        // longer trustworthy regardless of the evaluation outcome.
        if let Some(failure) = relay.take_failure() {
            return Err(failure);
        }

        transition(state, ConnState::Responding);
        let text = match outcome {
            Ok(result) => result,
            // Engine failures go back as ordinary response text; the
            // framing level does not distinguish them from success.
            Err(engine_error) => engine_error.to_string(),
        };
        let frame = OutboundFrame::encode(&Message::response(text))?;
        writer.send(frame).await?;

        transition(state, ConnState::AwaitingFrame);
        Ok(())
    }
}
