//! Client protocol stack for AI-9 fusion splicers.
//!
//! The splicer is driven over one BLE characteristic with a small binary
//! command/response protocol. This crate re-exports the layers:
//!
//! - [`transport`] — Duplex byte-channel abstraction
//! - [`frame`] — CRC-guarded framing and the opcode table
//! - [`record`] — Splice record codecs and image decoding
//! - [`session`] — Request/response session and event dispatch

/// Re-export transport types.
pub mod transport {
    pub use ai9_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ai9_frame::*;
}

/// Re-export record types.
pub mod record {
    pub use ai9_record::*;
}

/// Re-export session types.
pub mod session {
    pub use ai9_session::*;
}
