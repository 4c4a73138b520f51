//! Fixed-layout splice record codecs and image decoding for AI-9 devices.
//!
//! Everything here is pure: byte slices in, typed values out (and back).
//! Layouts are big-endian and fixed-size; a buffer of the wrong length is an
//! error, never padded or truncated.

pub mod error;
pub mod image;
pub mod meta;
pub mod settings;

pub use error::{RecordError, Result};
pub use image::{
    decode_bitmap, decode_runs, ImageAssembler, ImageChunk, BITMAP_SIZE, IMAGE_HEIGHT,
    IMAGE_WIDTH,
};
pub use meta::RecordMeta;
pub use settings::{AdminSettings, DateTime, FiberFunc, FiberSettings, HeatSettings};
