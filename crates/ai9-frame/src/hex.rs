//! Hex helpers for logs and captures.

use std::fmt::Write;

use crate::error::{FrameError, Result};

/// Lowercase hex without separators, as the device logs are written.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Parse hex text, ignoring ASCII whitespace between digits.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(FrameError::InvalidHex(format!(
            "odd number of digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}

fn nibble(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(FrameError::InvalidHex(format!(
            "unexpected character '{}'",
            other as char
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_lowercase_and_compact() {
        assert_eq!(encode(&[0x7e, 0x7e, 0x0a, 0xff]), "7e7e0aff");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn decode_ignores_whitespace() {
        assert_eq!(decode("7E 7e\n35\t00").unwrap(), vec![0x7e, 0x7e, 0x35, 0x00]);
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(matches!(decode("abc"), Err(FrameError::InvalidHex(_))));
        assert!(matches!(decode("zz"), Err(FrameError::InvalidHex(_))));
    }
}
