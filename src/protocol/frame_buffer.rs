//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. Unlike a
//! header-prefixed protocol there is no length to wait for: the decoder scans
//! for the first terminator byte, and everything before it is the payload.
//! "Need more data" is simply a scan that finds no terminator; the bytes stay
//! buffered for the next push.
//!
//! # Example
//!
//! ```
//! use replwire::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//!
//! // Data arrives in chunks from the socket
//! let messages = buffer.push(b"(+ 1 2)\x00").unwrap();
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].text().unwrap(), "(+ 1 2)");
//! ```

use bytes::BytesMut;

use super::wire_format::{Tag, DEFAULT_MAX_FRAME_SIZE};
use super::Message;
use crate::error::{ReplwireError, Result};

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// Calling [`push`](Self::push) repeatedly as bytes arrive never loses or
/// duplicates buffered unconsumed bytes.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Scan position: bytes before this offset are known terminator-free.
    scanned: usize,
    /// Maximum allowed frame size (payload + terminator).
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 8KB, max frame size: 16MB.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            scanned: 0,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// This is the main API for processing incoming data from the socket.
    /// Returns every message completed by this push; an empty vector means
    /// more data is needed.
    ///
    /// # Errors
    ///
    /// Returns a framing error if the buffered, unterminated data exceeds
    /// the maximum frame size.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        self.buffer.extend_from_slice(data);

        let mut messages = Vec::new();
        while let Some(message) = self.try_extract_one()? {
            messages.push(message);
        }

        Ok(messages)
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(message))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the unterminated data exceeds the frame size limit
    fn try_extract_one(&mut self) -> Result<Option<Message>> {
        // Resume scanning where the last call left off.
        let found = self.buffer[self.scanned..]
            .iter()
            .position(|&b| Tag::from_terminator(b).is_some())
            .map(|offset| self.scanned + offset);

        let Some(pos) = found else {
            self.scanned = self.buffer.len();
            if self.buffer.len() >= self.max_frame_size {
                return Err(ReplwireError::Framing(format!(
                    "unterminated frame exceeds maximum size {}",
                    self.max_frame_size
                )));
            }
            return Ok(None);
        };

        // Tag byte was matched by the scan above.
        let tag = Tag::from_terminator(self.buffer[pos]).expect("scan matched a terminator");

        let payload = self.buffer.split_to(pos).freeze();
        let _ = self.buffer.split_to(1); // drop the terminator byte
        self.scanned = 0;

        Ok(Some(Message::new(payload, tag)))
    }

    /// Get the number of buffered (unconsumed) bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"(+ 1 2)\x00").unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"(+ 1 2)");
        assert_eq!(frames[0].tag(), Tag::Response);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_roundtrip_law() {
        for tag in [Tag::Response, Tag::AsyncOutput] {
            let payload = b"roundtrip payload";
            let encoded = encode_frame(payload, tag).unwrap();
            assert_eq!(encoded.len(), payload.len() + 1);

            let mut buffer = FrameBuffer::new();
            let frames = buffer.push(&encoded).unwrap();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].payload(), payload);
            assert_eq!(frames[0].tag(), tag);
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"first\x00second\x01third\x00").unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[0].tag(), Tag::Response);
        assert_eq!(frames[1].payload(), b"second");
        assert_eq!(frames[1].tag(), Tag::AsyncOutput);
        assert_eq!(frames[2].payload(), b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_prefix_needs_more_data() {
        let mut buffer = FrameBuffer::new();
        let encoded = encode_frame(b"(+ 1 2)", Tag::Response).unwrap();

        // Every strict prefix decodes to nothing.
        for split in 0..encoded.len() {
            let mut b = FrameBuffer::new();
            assert!(b.push(&encoded[..split]).unwrap().is_empty());
            assert_eq!(b.len(), split);
        }

        // And the retained prefix completes once the rest arrives.
        assert!(buffer.push(&encoded[..3]).unwrap().is_empty());
        let frames = buffer.push(&encoded[3..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"(+ 1 2)");
    }

    #[test]
    fn test_idempotent_on_empty_push() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"incomplete").unwrap();

        // Repeated pushes of nothing keep returning NeedMoreData without
        // disturbing the buffered bytes.
        for _ in 0..3 {
            assert!(buffer.push(b"").unwrap().is_empty());
            assert_eq!(buffer.len(), 10);
        }

        let frames = buffer.push(b"\x00").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"incomplete");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let encoded = encode_frame(b"hi", Tag::AsyncOutput).unwrap();

        let mut all = Vec::new();
        for byte in &encoded {
            all.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].payload(), b"hi");
        assert_eq!(all[0].tag(), Tag::AsyncOutput);
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&[0x00]).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload().is_empty());
        assert_eq!(frames[0].tag(), Tag::Response);
    }

    #[test]
    fn test_max_frame_size_enforced() {
        let mut buffer = FrameBuffer::with_max_frame_size(16);

        assert!(buffer.push(&[b'x'; 8]).unwrap().is_empty());
        let result = buffer.push(&[b'x'; 8]);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("maximum size"));
    }

    #[test]
    fn test_frame_under_limit_still_decodes() {
        let mut buffer = FrameBuffer::with_max_frame_size(16);
        let frames = buffer.push(b"0123456789abcd\x00").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload().len(), 14);
    }

    #[test]
    fn test_clear_resets_buffer() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"partial").unwrap();
        assert!(!buffer.is_empty());

        buffer.clear();
        assert!(buffer.is_empty());

        let frames = buffer.push(b"fresh\x00").unwrap();
        assert_eq!(frames[0].payload(), b"fresh");
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"done\x00par").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"done");
        assert_eq!(buffer.len(), 3);

        let frames = buffer.push(b"tial\x01").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"partial");
        assert_eq!(frames[0].tag(), Tag::AsyncOutput);
    }
}
