//! CRC-guarded command/response framing for the AI-9 protocol.
//!
//! Every message on the wire is framed as:
//! - A 2-byte start marker (`0x7E7E`)
//! - A 1-byte [`Opcode`]
//! - A 2-byte big-endian body length
//! - The body
//! - A 2-byte big-endian CRC-16/MODBUS over everything before it
//! - A 1-byte stop marker (`0xAA`)
//!
//! Decoding never fails outright: [`decode_frame`] returns a [`Decoded`] tag
//! and the caller keeps looping until it reports [`Decoded::NeedMoreData`].

pub mod codec;
pub mod error;
pub mod hex;
pub mod opcode;

pub use codec::{
    checksum, decode_frame, encode_frame, frame_bytes, Decoded, Message, HEADER_SIZE, MAX_BODY,
    START, STOP, TRAILER_SIZE,
};
pub use error::{FrameError, RejectReason, Result};
pub use opcode::Opcode;
