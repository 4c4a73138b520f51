//! Multi-part image transfer and run-length bitmap decoding.
//!
//! The splicer sends the camera image of a splice as a sequence of
//! `GET_RECORD_IMG` chunks. Reassembled, the chunks form a stream of 2-byte
//! run descriptors that expand to a 640×480 one-byte-per-pixel bitmap.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{RecordError, Result};

pub const IMAGE_WIDTH: usize = 640;
pub const IMAGE_HEIGHT: usize = 480;

/// Size of a decoded bitmap in bytes.
pub const BITMAP_SIZE: usize = IMAGE_WIDTH * IMAGE_HEIGHT;

const CHUNK_HEADER_SIZE: usize = 3;
const RUN_COLOR_BIT: u16 = 0x8000;
const RUN_LENGTH_MASK: u16 = 0x7fff;

/// One `GET_RECORD_IMG` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageChunk<'a> {
    pub handle: u8,
    pub total: u8,
    pub part: u8,
    pub payload: &'a [u8],
}

impl<'a> ImageChunk<'a> {
    pub fn parse(body: &'a [u8]) -> Result<Self> {
        if body.len() < CHUNK_HEADER_SIZE {
            return Err(RecordError::ShortChunk(body.len()));
        }
        Ok(Self {
            handle: body[0],
            total: body[1],
            part: body[2],
            payload: &body[CHUNK_HEADER_SIZE..],
        })
    }

    /// The device numbers parts from 1; the final part has `part >= total`.
    pub fn is_last(&self) -> bool {
        self.part >= self.total
    }
}

/// Collects the chunks of one transfer.
#[derive(Debug)]
pub struct ImageAssembler {
    handle: u8,
    expected_len: usize,
    buf: BytesMut,
    parts: usize,
}

impl ImageAssembler {
    /// Start collecting the transfer `handle`, announced as `expected_len` bytes.
    pub fn new(handle: u8, expected_len: usize) -> Self {
        Self {
            handle,
            expected_len,
            buf: BytesMut::with_capacity(expected_len),
            parts: 0,
        }
    }

    pub fn handle(&self) -> u8 {
        self.handle
    }

    /// Number of chunks accepted so far.
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Bytes accumulated so far.
    pub fn received(&self) -> usize {
        self.buf.len()
    }

    /// Append one chunk body.
    ///
    /// Returns the assembled image once the final part arrives. Chunks of a
    /// foreign transfer and a final length that disagrees with the record are
    /// errors; the assembler must be discarded after one.
    pub fn push(&mut self, body: &[u8]) -> Result<Option<Bytes>> {
        let chunk = ImageChunk::parse(body)?;
        if chunk.handle != self.handle {
            return Err(RecordError::HandleMismatch {
                expected: self.handle,
                actual: chunk.handle,
            });
        }

        self.buf.extend_from_slice(chunk.payload);
        self.parts += 1;
        debug!(
            handle = self.handle,
            part = chunk.part,
            total = chunk.total,
            received = self.buf.len(),
            "image chunk"
        );

        if !chunk.is_last() {
            return Ok(None);
        }
        if self.buf.len() != self.expected_len {
            return Err(RecordError::ImageLength {
                expected: self.expected_len,
                actual: self.buf.len(),
            });
        }
        Ok(Some(std::mem::take(&mut self.buf).freeze()))
    }
}

/// Sum of the run lengths in a descriptor stream.
///
/// A lone trailing byte is rejected rather than read as a one-byte black run.
fn run_total(data: &[u8]) -> Result<usize> {
    if data.len() % 2 != 0 {
        return Err(RecordError::OddRunStream(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| usize::from(u16::from_be_bytes([pair[0], pair[1]]) & RUN_LENGTH_MASK))
        .fold(0usize, usize::saturating_add))
}

fn expand(data: &[u8], total: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(total);
    for pair in data.chunks_exact(2) {
        let descriptor = u16::from_be_bytes([pair[0], pair[1]]);
        let fill = if descriptor & RUN_COLOR_BIT != 0 { 0xff } else { 0x00 };
        let run = usize::from(descriptor & RUN_LENGTH_MASK);
        out.resize(out.len() + run, fill);
    }
    out
}

/// Expand run descriptors into at most `limit` bytes.
///
/// Each big-endian descriptor's top bit selects the fill (1 → `0xFF`,
/// 0 → `0x00`) and the low 15 bits give the run length. Shorter output is
/// fine; a stream that would expand past `limit` is rejected before anything
/// is allocated.
pub fn decode_runs(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let total = run_total(data)?;
    if total > limit {
        return Err(RecordError::RunOverflow {
            limit,
            actual: total,
        });
    }
    Ok(expand(data, total))
}

/// Expand a reassembled image into a 640×480 bitmap.
pub fn decode_bitmap(data: &[u8]) -> Result<Vec<u8>> {
    let total = run_total(data)?;
    if total != BITMAP_SIZE {
        return Err(RecordError::BitmapSize {
            expected: BITMAP_SIZE,
            actual: total,
        });
    }
    Ok(expand(data, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run-length stream for a full bitmap, alternating colours.
    fn full_image_runs() -> Vec<u8> {
        let mut runs = Vec::new();
        let mut left = BITMAP_SIZE;
        let mut white = false;
        while left > 0 {
            let run = left.min(RUN_LENGTH_MASK as usize);
            let descriptor = run as u16 | if white { RUN_COLOR_BIT } else { 0 };
            runs.extend_from_slice(&descriptor.to_be_bytes());
            left -= run;
            white = !white;
        }
        runs
    }

    fn chunk(handle: u8, total: u8, part: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![handle, total, part];
        body.extend_from_slice(payload);
        body
    }

    #[test]
    fn descriptor_examples() {
        assert_eq!(decode_runs(&[0x80, 0x02], BITMAP_SIZE).unwrap(), vec![0xff, 0xff]);
        assert_eq!(
            decode_runs(&[0x00, 0x03], BITMAP_SIZE).unwrap(),
            vec![0x00, 0x00, 0x00]
        );
        assert_eq!(decode_runs(&[0x80, 0x00], BITMAP_SIZE).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn concatenates_in_order() {
        let out = decode_runs(&[0x00, 0x01, 0x80, 0x02, 0x00, 0x01], BITMAP_SIZE).unwrap();
        assert_eq!(out, vec![0x00, 0xff, 0xff, 0x00]);
    }

    #[test]
    fn odd_stream_rejected() {
        assert_eq!(
            decode_runs(&[0x80, 0x02, 0x01], BITMAP_SIZE),
            Err(RecordError::OddRunStream(3))
        );
        assert_eq!(
            decode_bitmap(&[0x80, 0x02, 0x01]),
            Err(RecordError::OddRunStream(3))
        );
    }

    #[test]
    fn oversized_stream_rejected_without_expanding() {
        // 1 MiB of maximal white runs would expand to about 16 GiB.
        let runs = vec![0xffu8; 1 << 20];
        let expected_total = (1usize << 19) * RUN_LENGTH_MASK as usize;

        assert_eq!(
            decode_runs(&runs, BITMAP_SIZE),
            Err(RecordError::RunOverflow {
                limit: BITMAP_SIZE,
                actual: expected_total
            })
        );
        assert_eq!(
            decode_bitmap(&runs),
            Err(RecordError::BitmapSize {
                expected: BITMAP_SIZE,
                actual: expected_total
            })
        );
    }

    #[test]
    fn runs_up_to_limit_accepted() {
        assert_eq!(decode_runs(&[0x80, 0x04], 4).unwrap().len(), 4);
        assert_eq!(
            decode_runs(&[0x80, 0x04, 0x00, 0x01], 4),
            Err(RecordError::RunOverflow {
                limit: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn bitmap_size_enforced() {
        assert_eq!(
            decode_bitmap(&[0x80, 0x02]),
            Err(RecordError::BitmapSize {
                expected: BITMAP_SIZE,
                actual: 2
            })
        );

        let bitmap = decode_bitmap(&full_image_runs()).unwrap();
        assert_eq!(bitmap.len(), BITMAP_SIZE);
        assert_eq!(bitmap[0], 0x00);
        assert_eq!(bitmap[RUN_LENGTH_MASK as usize], 0xff);
    }

    #[test]
    fn assembles_parts_then_decodes() {
        let runs = full_image_runs();
        let pieces: Vec<&[u8]> = runs.chunks(7).collect();
        let total = pieces.len() as u8;
        let mut assembler = ImageAssembler::new(5, runs.len());

        let mut image = None;
        for (i, piece) in pieces.iter().enumerate() {
            image = assembler.push(&chunk(5, total, i as u8 + 1, piece)).unwrap();
            if i + 1 < pieces.len() {
                assert!(image.is_none());
            }
        }

        let image = image.expect("last part completes the transfer");
        assert_eq!(image.as_ref(), runs.as_slice());
        assert_eq!(assembler.parts(), pieces.len());
        assert_eq!(decode_bitmap(&image).unwrap().len(), BITMAP_SIZE);
    }

    #[test]
    fn foreign_handle_rejected() {
        let mut assembler = ImageAssembler::new(1, 4);
        assembler.push(&chunk(1, 2, 1, &[0x80, 0x01])).unwrap();
        assert_eq!(
            assembler.push(&chunk(2, 2, 2, &[0x00, 0x01])),
            Err(RecordError::HandleMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let mut assembler = ImageAssembler::new(1, 10);
        assert_eq!(
            assembler.push(&chunk(1, 1, 1, &[0x80, 0x01])),
            Err(RecordError::ImageLength {
                expected: 10,
                actual: 2
            })
        );
    }

    #[test]
    fn short_chunk_rejected() {
        let mut assembler = ImageAssembler::new(1, 0);
        assert_eq!(assembler.push(&[1, 1]), Err(RecordError::ShortChunk(2)));
    }

    #[test]
    fn part_beyond_total_terminates() {
        let mut assembler = ImageAssembler::new(9, 2);
        let image = assembler.push(&chunk(9, 1, 3, &[0x00, 0x02])).unwrap();
        assert_eq!(image.unwrap().as_ref(), &[0x00, 0x02]);
    }
}
