//! Output relay: bridges the engine's synchronous output callback to the
//! connection writer.
//!
//! The engine invokes [`OutputSink::emit`] on the blocking thread that drives
//! `evaluate`. The relay encodes each chunk as exactly one AsyncOutput frame
//! and hands it to the writer task immediately; no merging, no reordering,
//! no buffering beyond the writer's queue.
//!
//! `emit` has no way to surface an error to the engine, so the relay latches
//! the first failure instead. The connection handler checks
//! [`take_failure`](OutputRelay::take_failure) after `evaluate` returns and
//! closes the connection if anything went wrong. Once failed, the relay
//! drops further chunks; evaluation finishes on its own, but nothing more
//! reaches the wire.

use std::sync::Mutex;

use crate::engine::OutputSink;
use crate::error::{ReplwireError, Result};
use crate::protocol::Message;
use crate::writer::{OutboundFrame, WriterHandle};

/// Sink that forwards engine output chunks to the connection writer.
///
/// One relay is created per `evaluate` call and discarded afterwards, so a
/// stale sink can never outlive the call it belongs to.
pub struct OutputRelay {
    writer: WriterHandle,
    failure: Mutex<Option<ReplwireError>>,
}

impl OutputRelay {
    /// Create a relay that writes through the given writer handle.
    pub fn new(writer: WriterHandle) -> Self {
        Self {
            writer,
            failure: Mutex::new(None),
        }
    }

    /// Take the first failure recorded during the evaluation, if any.
    pub fn take_failure(&self) -> Option<ReplwireError> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn record_failure(&self, error: ReplwireError) {
        let mut slot = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    fn forward(&self, chunk: &str) -> Result<()> {
        let frame = OutboundFrame::encode(&Message::async_output(chunk))?;
        self.writer.blocking_send(frame)
    }
}

impl OutputSink for OutputRelay {
    fn emit(&self, chunk: &str) {
        {
            let slot = self.failure.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return;
            }
        }

        if let Err(e) = self.forward(chunk) {
            tracing::warn!("Dropping engine output after write failure: {}", e);
            self.record_failure(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::spawn_writer_task;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_chunks_forwarded_as_async_output_frames() {
        let (client, mut server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client);
        let relay = OutputRelay::new(handle.clone());

        // emit uses blocking_send, so drive it off the async threads.
        tokio::task::spawn_blocking(move || {
            relay.emit("hi\n");
            relay.emit("there\n");
            assert!(relay.take_failure().is_none());
        })
        .await
        .unwrap();

        drop(handle);
        task.await.unwrap().unwrap();

        let mut buf = Vec::new();
        server.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hi\n\x01there\n\x01");
    }

    #[tokio::test]
    async fn test_failure_latched_and_later_chunks_dropped() {
        let (client, server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client);

        // Kill the transport so the writer task dies on its first write.
        drop(server);
        let probe = OutboundFrame::encode(&Message::response("x")).unwrap();
        let _ = handle.send(probe).await;
        let _ = task.await;

        let relay = OutputRelay::new(handle);
        let failure = tokio::task::spawn_blocking(move || {
            relay.emit("lost");
            relay.emit("also lost");
            relay.take_failure()
        })
        .await
        .unwrap();

        assert!(matches!(failure, Some(ReplwireError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_chunk_with_terminator_byte_is_a_failure() {
        let (client, _server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);
        let relay = OutputRelay::new(handle);

        let failure = tokio::task::spawn_blocking(move || {
            relay.emit("bad\u{0}chunk");
            relay.take_failure()
        })
        .await
        .unwrap();

        assert!(matches!(failure, Some(ReplwireError::Framing(_))));
    }

    #[tokio::test]
    async fn test_take_failure_clears_slot() {
        let (client, _server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client);
        let relay = OutputRelay::new(handle);

        let (first, second) = tokio::task::spawn_blocking(move || {
            relay.emit("bad\u{1}");
            (relay.take_failure(), relay.take_failure())
        })
        .await
        .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }
}
