use std::time::Duration;

use ai9_frame::Opcode;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] ai9_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] ai9_frame::FrameError),

    /// A record, image chunk or bitmap failed to decode.
    #[error("record error: {0}")]
    Record(#[from] ai9_record::RecordError),

    /// The reply to a request carried a different opcode.
    #[error("response opcode {received} does not match request {sent}")]
    OpcodeMismatch { sent: Opcode, received: Opcode },

    /// A set command was answered with something other than the expected ack.
    #[error("{opcode} acknowledged with {actual:02x?} (expected {expected:02x?})")]
    AckMismatch {
        opcode: Opcode,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// A message arrived that does not belong to the running exchange.
    #[error("unexpected {received} while waiting for {expected}")]
    UnexpectedMessage { expected: Opcode, received: Opcode },

    /// A response body has a shape the decoder cannot use.
    #[error("malformed {opcode} response ({len} bytes)")]
    Malformed { opcode: Opcode, len: usize },

    /// No message arrived within the configured bound.
    #[error("no response after {0:?}")]
    Timeout(Duration),

    /// The transport stopped delivering data.
    #[error("device disconnected")]
    Disconnected,
}

impl SessionError {
    /// True for request-level failures: a reply that arrived but was wrong.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SessionError::OpcodeMismatch { .. } | SessionError::AckMismatch { .. }
        )
    }

    /// True for protocol violations inside a read path.
    pub fn is_invalid(&self) -> bool {
        matches!(
            self,
            SessionError::UnexpectedMessage { .. }
                | SessionError::Record(_)
                | SessionError::Malformed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
