/// Errors raised while decoding records and images.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A fixed-size layout got the wrong number of bytes.
    #[error("{what} needs {expected} bytes, got {actual}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The reserved tail of the admin settings was not zero.
    #[error("admin settings trailer must be zero, got {0:02x?}")]
    AdminTrailer([u8; 3]),

    /// An image chunk is too short to carry its header.
    #[error("image chunk too short ({0} bytes)")]
    ShortChunk(usize),

    /// An image chunk belongs to a different transfer.
    #[error("image chunk for handle {actual}, expected {expected}")]
    HandleMismatch { expected: u8, actual: u8 },

    /// The reassembled image length disagrees with the record.
    #[error("image is {actual} bytes, record declares {expected}")]
    ImageLength { expected: usize, actual: usize },

    /// Run-length data must be whole 2-byte descriptors.
    #[error("run-length stream has odd length ({0} bytes)")]
    OddRunStream(usize),

    /// Run-length data would expand past the allowed size.
    #[error("run-length stream expands to {actual} bytes, limit is {limit}")]
    RunOverflow { limit: usize, actual: usize },

    /// Decoded bitmap has the wrong size.
    #[error("bitmap decodes to {actual} bytes, expected {expected}")]
    BitmapSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RecordError>;

pub(crate) fn expect_len(what: &'static str, expected: usize, data: &[u8]) -> Result<()> {
    if data.len() != expected {
        return Err(RecordError::Length {
            what,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}
