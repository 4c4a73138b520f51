use std::fmt;
use std::io;

use ai9_frame::FrameError;
use ai9_record::RecordError;

// Exit codes follow the sysexits-style ranges shared by our CLIs.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::UnknownOpcode(_) | FrameError::UnknownOpcodeName(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        FrameError::InvalidHex(_) | FrameError::BodyTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn record_error(context: &str, err: RecordError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_frame_errors() {
        assert_eq!(frame_error("x", FrameError::UnknownOpcode(1)).code, USAGE);
        assert_eq!(
            frame_error("x", FrameError::InvalidHex("odd".into())).code,
            DATA_INVALID
        );
    }

    #[test]
    fn maps_io_errors() {
        let err = io_error("read", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("read: "));

        let err = io_error("write stdout", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.code, FAILURE);
    }
}
