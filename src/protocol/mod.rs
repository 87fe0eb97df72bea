//! Wire protocol: frame codec and incremental decoder.
//!
//! A frame is payload bytes followed by a single terminator byte. Terminator
//! `0x00` marks a [`Tag::Response`] frame, `0x01` a [`Tag::AsyncOutput`]
//! frame. See [`wire_format`] for the byte-level contract and
//! [`FrameBuffer`] for streaming decode.

mod frame;
mod frame_buffer;
pub mod wire_format;

pub use frame::Message;
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    encode_frame, is_terminator, validate_payload, Tag, ASYNC_OUTPUT_TERMINATOR,
    DEFAULT_MAX_FRAME_SIZE, RESPONSE_TERMINATOR,
};
