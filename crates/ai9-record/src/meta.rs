use bytes::{Buf, BufMut};
use serde::Serialize;

use crate::error::{expect_len, Result};
use crate::settings::{AdminSettings, DateTime, FiberSettings};

/// Metadata of one stored splice.
///
/// Layout (big-endian, 71 bytes):
/// ```text
///  0  datetime (6)        52 face_detection
///  6  failure             53 angle_detection
///  7  loss                54 autofocus
///  8  angles (3)          55 admin (12)
/// 11  face_quality        67 charge
/// 12  coordinates (12×u16) 68 image_len (u16)
/// 36  settings (16)       70 image_handle
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMeta {
    pub datetime: DateTime,
    pub failure: u8,
    pub loss: u8,
    pub angles: [u8; 3],
    pub face_quality: u8,
    pub coordinates: [u16; 12],
    pub settings: FiberSettings,
    pub face_detection: u8,
    pub angle_detection: u8,
    pub autofocus: u8,
    pub admin: AdminSettings,
    pub charge: u8,
    /// Size of the run-length encoded image, 0 when there is none.
    pub image_len: u16,
    /// Transfer handle tagging the image chunks.
    pub image_handle: u8,
}

impl RecordMeta {
    pub const SIZE: usize = 71;

    /// Decode the body of a `GET_CURRENT_RECORD` response.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        expect_len("record meta", Self::SIZE, data)?;

        let datetime = DateTime::unpack(&data[..6])?;
        let mut buf = &data[6..36];
        let failure = buf.get_u8();
        let loss = buf.get_u8();
        let angles = [buf.get_u8(), buf.get_u8(), buf.get_u8()];
        let face_quality = buf.get_u8();
        let mut coordinates = [0u16; 12];
        for coordinate in &mut coordinates {
            *coordinate = buf.get_u16();
        }

        let settings = FiberSettings::unpack(&data[36..52])?;
        let (face_detection, angle_detection, autofocus) = (data[52], data[53], data[54]);
        let admin = AdminSettings::unpack(&data[55..67])?;

        let mut tail = &data[67..];
        let charge = tail.get_u8();
        let image_len = tail.get_u16();
        let image_handle = tail.get_u8();

        Ok(Self {
            datetime,
            failure,
            loss,
            angles,
            face_quality,
            coordinates,
            settings,
            face_detection,
            angle_detection,
            autofocus,
            admin,
            charge,
            image_len,
            image_handle,
        })
    }

    /// Encode back into the wire layout; this is also the persisted form.
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.put_slice(&self.datetime.pack());
        out.put_u8(self.failure);
        out.put_u8(self.loss);
        out.put_slice(&self.angles);
        out.put_u8(self.face_quality);
        for coordinate in self.coordinates {
            out.put_u16(coordinate);
        }
        out.put_slice(&self.settings.pack());
        out.put_u8(self.face_detection);
        out.put_u8(self.angle_detection);
        out.put_u8(self.autofocus);
        out.put_slice(&self.admin.pack());
        out.put_u8(self.charge);
        out.put_u16(self.image_len);
        out.put_u8(self.image_handle);
        out
    }

    pub fn has_image(&self) -> bool {
        self.image_len > 0
    }
}
