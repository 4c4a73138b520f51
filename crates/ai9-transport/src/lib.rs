//! Duplex byte-channel abstraction for the AI-9 splicer link.
//!
//! The splicer speaks over a single BLE characteristic: writes go out on it and
//! notifications come back on it. Nothing in this crate knows about framing;
//! a [`Transport`] moves opaque bytes and hands every received chunk to a
//! subscriber callback, with no promise that chunk boundaries line up with
//! message boundaries.
//!
//! This is the lowest layer of ai9. Everything else builds on top of the
//! [`Transport`] trait provided here.

pub mod error;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use stream::StreamTransport;
pub use traits::{OnData, Transport, MESSAGE_CHARACTERISTIC};
