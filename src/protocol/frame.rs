//! Message value type.
//!
//! A [`Message`] is an immutable payload/tag pair, created once per frame and
//! consumed by the writer or the connection handler. Uses `bytes::Bytes` for
//! cheap payload sharing.
//!
//! # Example
//!
//! ```
//! use replwire::protocol::{Message, Tag};
//!
//! let msg = Message::response("3");
//! assert_eq!(msg.tag(), Tag::Response);
//! assert_eq!(msg.encode().unwrap(), vec![b'3', 0x00]);
//! ```

use bytes::Bytes;

use super::wire_format::{encode_frame, Tag};
use crate::error::{ReplwireError, Result};

/// One unit of the wire protocol: payload bytes plus a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    tag: Tag,
}

impl Message {
    /// Create a message from payload bytes and a tag.
    pub fn new(payload: Bytes, tag: Tag) -> Self {
        Self { payload, tag }
    }

    /// Create a Response-tagged message from text.
    pub fn response(text: impl Into<String>) -> Self {
        Self::new(Bytes::from(text.into()), Tag::Response)
    }

    /// Create an AsyncOutput-tagged message from text.
    pub fn async_output(text: impl Into<String>) -> Self {
        Self::new(Bytes::from(text.into()), Tag::AsyncOutput)
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as `Bytes` (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the frame tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// View the payload as UTF-8 text.
    ///
    /// Evaluation requests and results are text; anything else on the wire is
    /// a framing violation.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.payload)
            .map_err(|e| ReplwireError::Framing(format!("payload is not valid UTF-8: {e}")))
    }

    /// Encode this message into a complete frame.
    ///
    /// # Errors
    ///
    /// Returns a framing error if the payload contains a terminator byte.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(&self.payload, self.tag)
    }
}
