//! Dedicated writer task for frame sending.
//!
//! A single mpsc channel feeds one task that owns the socket write half and
//! writes frames in arrival order. The channel's FIFO guarantee is what makes
//! the protocol's ordering invariant mechanical: AsyncOutput frames enter the
//! channel while the engine is still evaluating, the Response frame enters
//! after `evaluate` returns, so output always reaches the wire before the
//! response it belongs to.
//!
//! ```text
//! Output Relay ──┐
//!                ├─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Socket
//! Conn Handler ──┘
//! ```
//!
//! Each frame is written and flushed individually: the protocol forbids
//! merging or delaying output chunks.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ReplwireError, Result};
use crate::protocol::Message;

/// Default channel capacity for the frame queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A pre-encoded frame ready to be written to the socket.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    bytes: Bytes,
}

impl OutboundFrame {
    /// Encode a message into an outbound frame.
    ///
    /// # Errors
    ///
    /// Returns a framing error if the message payload contains a terminator
    /// byte.
    pub fn encode(message: &Message) -> Result<Self> {
        Ok(Self {
            bytes: Bytes::from(message.encode()?),
        })
    }

    /// Total size of this frame on the wire (payload + terminator).
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A frame is never empty (the terminator byte is always present).
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The encoded frame bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Handle for sending frames to the writer task.
///
/// Cheaply cloneable; shared by the connection handler and the output relay.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Send a frame to the writer task.
    ///
    /// Fails with `ConnectionClosed` if the writer task has stopped.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ReplwireError::ConnectionClosed)
    }

    /// Send a frame from synchronous code.
    ///
    /// For the engine's output callback, which runs on a blocking thread.
    /// Must not be called from an async context.
    pub fn blocking_send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .blocking_send(frame)
            .map_err(|_| ReplwireError::ConnectionClosed)
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// The task exits cleanly once every handle is dropped (after draining the
/// channel), or with an error if a write fails.
pub fn spawn_writer_task<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

/// Main writer loop: receive frames and write them to the socket in order.
async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundFrame>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
    }
    // All handles dropped, clean shutdown.
    Ok(())
}
