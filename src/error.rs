//! Error types for replwire.

use thiserror::Error;

/// Main error type for all replwire operations.
#[derive(Debug, Error)]
pub enum ReplwireError {
    /// I/O error during socket operations (read, write, accept, bind).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error (payload contains a terminator byte, oversize frame,
    /// invalid UTF-8 request, or an unexpected frame tag from the client).
    #[error("Framing error: {0}")]
    Framing(String),

    /// Connection closed while frames were still being sent.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The evaluation task failed to complete (the engine panicked).
    ///
    /// Not to be confused with [`EngineError`](crate::engine::EngineError),
    /// which is an ordinary evaluation failure and goes back to the client
    /// as response text.
    #[error("Evaluation task failed: {0}")]
    Evaluation(String),
}

/// Result type alias using ReplwireError.
pub type Result<T> = std::result::Result<T, ReplwireError>;
