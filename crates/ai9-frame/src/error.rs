/// Errors that can occur while building frames or parsing opcodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The body does not fit the 16-bit length field.
    #[error("frame body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The byte is not part of the opcode table.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// The opcode name could not be resolved.
    #[error("unknown opcode name '{0}'")]
    UnknownOpcodeName(String),

    /// Hex text could not be parsed.
    #[error("invalid hex input: {0}")]
    InvalidHex(String),
}

/// Why a complete frame was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// Trailing checksum or stop byte does not match.
    #[error("checksum mismatch (have {actual:#06x}, want {expected:#06x}, stop {stop:#04x})")]
    Checksum { expected: u16, actual: u16, stop: u8 },

    /// Frame is intact but carries an opcode outside the table.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
}

pub type Result<T> = std::result::Result<T, FrameError>;
