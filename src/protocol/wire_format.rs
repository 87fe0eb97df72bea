//! Wire format encoding.
//!
//! The protocol has no header: a frame is the payload bytes followed by a
//! single terminator byte.
//!
//! ```text
//! ┌────────────────┬────────────┐
//! │ Payload        │ Terminator │
//! │ UTF-8 text     │ 1 byte     │
//! └────────────────┴────────────┘
//! ```
//!
//! Terminator `0x00` marks a Response frame (request from the client, result
//! to the client). Terminator `0x01` marks an AsyncOutput frame (one chunk of
//! engine-produced output, pushed server→client while a request is pending).
//!
//! Payloads are REPL text and must not contain either terminator byte; the
//! encoder rejects payloads that do. There is no escaping scheme.

use crate::error::{ReplwireError, Result};

/// Terminator byte for Response frames.
pub const RESPONSE_TERMINATOR: u8 = 0x00;

/// Terminator byte for AsyncOutput frames.
pub const ASYNC_OUTPUT_TERMINATOR: u8 = 0x01;

/// Default maximum frame size (16 MB).
///
/// A buffer that grows past this without a terminator is a framing error.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Frame tag, the decoded meaning of the terminator byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Request from the client or result to the client.
    Response,
    /// Engine-produced output pushed to the client during evaluation.
    AsyncOutput,
}

impl Tag {
    /// The terminator byte for this tag.
    #[inline]
    pub fn terminator(self) -> u8 {
        match self {
            Tag::Response => RESPONSE_TERMINATOR,
            Tag::AsyncOutput => ASYNC_OUTPUT_TERMINATOR,
        }
    }

    /// Decode a terminator byte back into a tag.
    ///
    /// Returns `None` for any byte that is not a terminator.
    #[inline]
    pub fn from_terminator(byte: u8) -> Option<Self> {
        match byte {
            RESPONSE_TERMINATOR => Some(Tag::Response),
            ASYNC_OUTPUT_TERMINATOR => Some(Tag::AsyncOutput),
            _ => None,
        }
    }
}

/// Check whether a byte is one of the two terminator values.
#[inline]
pub fn is_terminator(byte: u8) -> bool {
    byte == RESPONSE_TERMINATOR || byte == ASYNC_OUTPUT_TERMINATOR
}

/// Validate that a payload is safe to frame.
///
/// A payload containing a terminator byte would corrupt framing, so it is
/// rejected here rather than escaped.
pub fn validate_payload(payload: &[u8]) -> Result<()> {
    if let Some(pos) = payload.iter().position(|&b| is_terminator(b)) {
        return Err(ReplwireError::Framing(format!(
            "payload contains terminator byte 0x{:02x} at offset {}",
            payload[pos], pos
        )));
    }
    Ok(())
}

/// Encode a payload and tag into a complete frame.
///
/// # Errors
///
/// Returns a framing error if the payload contains a terminator byte.
///
/// # Example
///
/// ```
/// use replwire::protocol::{encode_frame, Tag};
///
/// let bytes = encode_frame(b"3", Tag::Response).unwrap();
/// assert_eq!(bytes, vec![b'3', 0x00]);
/// ```
pub fn encode_frame(payload: &[u8], tag: Tag) -> Result<Vec<u8>> {
    validate_payload(payload)?;
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.extend_from_slice(payload);
    buf.push(tag.terminator());
    Ok(buf)
}
