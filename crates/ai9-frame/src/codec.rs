use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc::{Crc, CRC_16_MODBUS};

use crate::error::{FrameError, RejectReason, Result};
use crate::opcode::Opcode;

/// Start marker, sent big-endian.
pub const START: u16 = 0x7e7e;

/// Stop marker closing every frame.
pub const STOP: u8 = 0xaa;

/// Frame header: start (2) + opcode (1) + length (2) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Frame trailer: checksum (2) + stop (1) = 3 bytes.
pub const TRAILER_SIZE: usize = 3;

/// Largest body the 16-bit length field can describe.
pub const MAX_BODY: usize = u16::MAX as usize;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// A validated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub opcode: Opcode,
    pub body: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(opcode: Opcode, body: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            body: body.into(),
        }
    }

    /// The total wire size of this message once framed.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len() + TRAILER_SIZE
    }
}

/// Outcome of one [`decode_frame`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Not enough bytes buffered; nothing was consumed.
    NeedMoreData,
    /// The buffer did not start with the start marker; one byte was dropped.
    Desync { skipped: u8 },
    /// A complete, valid frame was consumed.
    Frame(Message),
    /// A complete frame was consumed but failed validation.
    Rejected(RejectReason),
}

/// CRC-16/MODBUS of `data`.
pub fn checksum(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬────────┬──────────┬────────────┬──────────┬──────┐
/// │ Start (2) │ Op (1) │ Len (2B) │ Body       │ CRC (2B) │ Stop │
/// │ 0x7E 0x7E │        │ BE       │ (Len bytes)│ BE       │ 0xAA │
/// └───────────┴────────┴──────────┴────────────┴──────────┴──────┘
/// ```
/// The CRC covers start, opcode, length and body.
pub fn encode_frame(opcode: Opcode, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > MAX_BODY {
        return Err(FrameError::BodyTooLarge {
            size: body.len(),
            max: MAX_BODY,
        });
    }
    dst.reserve(HEADER_SIZE + body.len() + TRAILER_SIZE);
    let start = dst.len();
    dst.put_u16(START);
    dst.put_u8(opcode.as_u8());
    dst.put_u16(body.len() as u16);
    dst.put_slice(body);
    let crc = checksum(&dst[start..]);
    dst.put_u16(crc);
    dst.put_u8(STOP);
    Ok(())
}

/// Encode a message into a fresh buffer.
pub fn frame_bytes(opcode: Opcode, body: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_frame(opcode, body, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode at most one frame from the head of `src`.
///
/// Consumes exactly one byte on [`Decoded::Desync`], nothing on
/// [`Decoded::NeedMoreData`] and the whole frame otherwise. A corrupted frame
/// is dropped, not retried.
pub fn decode_frame(src: &mut BytesMut) -> Decoded {
    if src.len() < HEADER_SIZE {
        return Decoded::NeedMoreData;
    }

    if u16::from_be_bytes([src[0], src[1]]) != START {
        let skipped = src[0];
        src.advance(1);
        return Decoded::Desync { skipped };
    }

    let raw_opcode = src[2];
    let body_len = u16::from_be_bytes([src[3], src[4]]) as usize;
    let total = HEADER_SIZE + body_len + TRAILER_SIZE;
    if src.len() < total {
        return Decoded::NeedMoreData;
    }

    let mut frame = src.split_to(total);
    let expected = checksum(&frame[..HEADER_SIZE + body_len]);
    let mut tail = &frame[HEADER_SIZE + body_len..];
    let actual = tail.get_u16();
    let stop = tail.get_u8();
    if actual != expected || stop != STOP {
        return Decoded::Rejected(RejectReason::Checksum {
            expected,
            actual,
            stop,
        });
    }

    let opcode = match Opcode::try_from(raw_opcode) {
        Ok(op) => op,
        Err(_) => return Decoded::Rejected(RejectReason::UnknownOpcode(raw_opcode)),
    };

    frame.advance(HEADER_SIZE);
    frame.truncate(body_len);
    Decoded::Frame(Message {
        opcode,
        body: frame.freeze(),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn decode_all(buf: &mut BytesMut) -> Vec<Decoded> {
        let mut out = Vec::new();
        loop {
            match decode_frame(buf) {
                Decoded::NeedMoreData => return out,
                other => out.push(other),
            }
        }
    }

    #[test]
    fn known_frame_layout() {
        let wire = frame_bytes(Opcode::GetSerial, &[0x55]).unwrap();
        let crc = checksum(&[0x7e, 0x7e, 0x35, 0x00, 0x01, 0x55]).to_be_bytes();
        assert_eq!(
            wire.as_ref(),
            &[0x7e, 0x7e, 0x35, 0x00, 0x01, 0x55, crc[0], crc[1], 0xaa]
        );
    }

    #[test]
    fn modbus_check_value() {
        // Standard CRC catalogue check input.
        assert_eq!(checksum(b"123456789"), 0x4b37);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        encode_frame(Opcode::GetDatetime, b"\x15\x03\x1c\x0c\x00\x2a", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 6 + TRAILER_SIZE);

        let decoded = decode_frame(&mut buf);
        assert_eq!(
            decoded,
            Decoded::Frame(Message::new(
                Opcode::GetDatetime,
                &b"\x15\x03\x1c\x0c\x00\x2a"[..]
            ))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn roundtrip_every_opcode_and_boundary_length() {
        for &len in &[0usize, 1, 255, MAX_BODY - HEADER_SIZE - TRAILER_SIZE] {
            let body: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            for &op in Opcode::ALL {
                let mut buf = BytesMut::new();
                encode_frame(op, &body, &mut buf).unwrap();
                match decode_frame(&mut buf) {
                    Decoded::Frame(msg) => {
                        assert_eq!(msg.opcode, op);
                        assert_eq!(msg.body.as_ref(), body.as_slice());
                    }
                    other => panic!("unexpected {other:?} for {op} len {len}"),
                }
                assert!(buf.is_empty());
            }
        }
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x7e, 0x7e, 0x35][..]);
        assert_eq!(decode_frame(&mut buf), Decoded::NeedMoreData);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_frame(Opcode::GetSerial, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert_eq!(decode_frame(&mut buf), Decoded::NeedMoreData);
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn junk_byte_resynchronizes() {
        let mut buf = BytesMut::from(&[0x00][..]);
        encode_frame(Opcode::GetMode, b"\x01", &mut buf).unwrap();

        let results = decode_all(&mut buf);
        assert_eq!(
            results,
            vec![
                Decoded::Desync { skipped: 0x00 },
                Decoded::Frame(Message::new(Opcode::GetMode, &b"\x01"[..])),
            ]
        );
    }

    #[test]
    fn half_marker_resynchronizes() {
        // A lone 0x7e before a real frame must not swallow the frame.
        let mut buf = BytesMut::from(&[0x7e][..]);
        encode_frame(Opcode::GetMode, b"", &mut buf).unwrap();

        let results = decode_all(&mut buf);
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Decoded::Desync { skipped: 0x7e }));
        assert!(matches!(&results[1], Decoded::Frame(m) if m.opcode == Opcode::GetMode));
    }

    #[test]
    fn bad_stop_byte_is_rejected() {
        let mut buf = BytesMut::new();
        encode_frame(Opcode::GetSerial, b"x", &mut buf).unwrap();
        let last = buf.len() - 1;
        buf[last] = 0xab;

        assert!(matches!(
            decode_frame(&mut buf),
            Decoded::Rejected(RejectReason::Checksum { stop: 0xab, .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn unknown_opcode_with_valid_crc_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u16(START);
        buf.put_u8(0x01);
        buf.put_u16(1);
        buf.put_u8(0x55);
        let crc = checksum(&buf);
        buf.put_u16(crc);
        buf.put_u8(STOP);

        assert_eq!(
            decode_frame(&mut buf),
            Decoded::Rejected(RejectReason::UnknownOpcode(0x01))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn rejected_frame_does_not_hide_next_frame() {
        let mut buf = BytesMut::new();
        encode_frame(Opcode::GetSerial, b"bad", &mut buf).unwrap();
        buf[HEADER_SIZE] ^= 0x01;
        encode_frame(Opcode::GetSerial, b"good", &mut buf).unwrap();

        let results = decode_all(&mut buf);
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Decoded::Rejected(_)));
        assert_eq!(
            results[1],
            Decoded::Frame(Message::new(Opcode::GetSerial, &b"good"[..]))
        );
    }

    #[test]
    fn test_body_too_large() {
        let body = vec![0u8; MAX_BODY + 1];
        let mut buf = BytesMut::new();
        let err = encode_frame(Opcode::SetFirmwareData, &body, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_message_wire_size() {
        let msg = Message::new(Opcode::GetSerial, Bytes::from_static(b"test"));
        assert_eq!(msg.wire_size(), HEADER_SIZE + 4 + TRAILER_SIZE);
    }

    proptest! {
        #[test]
        fn single_bit_flip_in_body_is_rejected(
            body in proptest::collection::vec(any::<u8>(), 1..512),
            op_index in 0..Opcode::ALL.len(),
            bit in any::<prop::sample::Index>(),
        ) {
            let op = Opcode::ALL[op_index];
            let mut buf = BytesMut::new();
            encode_frame(op, &body, &mut buf).unwrap();
            let bit = bit.index(body.len() * 8);
            buf[HEADER_SIZE + bit / 8] ^= 1 << (bit % 8);

            let decoded = decode_frame(&mut buf);
            prop_assert!(
                matches!(decoded, Decoded::Rejected(RejectReason::Checksum { .. })),
                "got {:?}", decoded
            );
        }

        #[test]
        fn fragmented_delivery_matches_whole(
            body in proptest::collection::vec(any::<u8>(), 0..300),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let wire = frame_bytes(Opcode::GetRecordImg, &body).unwrap();
            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(wire.len())).collect();
            points.push(wire.len());
            points.sort_unstable();

            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            let mut from = 0;
            for to in points {
                buf.extend_from_slice(&wire[from..to]);
                from = to;
                decoded.extend(decode_all(&mut buf));
            }

            prop_assert_eq!(
                decoded,
                vec![Decoded::Frame(Message::new(Opcode::GetRecordImg, body))]
            );
            prop_assert!(buf.is_empty());
        }
    }
}
