//! Device clock and configuration blobs.

use std::fmt;

use serde::Serialize;

use crate::error::{expect_len, RecordError, Result};

/// Device timestamp. The year is a two-digit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const SIZE: usize = 6;

    pub fn unpack(data: &[u8]) -> Result<Self> {
        expect_len("datetime", Self::SIZE, data)?;
        Ok(Self {
            year: data[0],
            month: data[1],
            day: data[2],
            hour: data[3],
            minute: data[4],
            second: data[5],
        })
    }

    pub fn pack(&self) -> [u8; Self::SIZE] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

macro_rules! opaque_blob {
    ($(#[$doc:meta])* $name:ident, $size:literal, $what:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub struct $name(pub [u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;

            pub fn unpack(data: &[u8]) -> Result<Self> {
                expect_len($what, Self::SIZE, data)?;
                let mut raw = [0u8; $size];
                raw.copy_from_slice(data);
                Ok(Self(raw))
            }

            pub fn pack(&self) -> [u8; $size] {
                self.0
            }
        }
    };
}

opaque_blob!(
    /// Splice program parameters, e.g. `0000641e01140c14281e0100288c8200`.
    FiberSettings,
    16,
    "fiber settings"
);

opaque_blob!(
    /// Feature switches.
    FiberFunc,
    12,
    "fiber func"
);

opaque_blob!(
    /// Heater program, e.g. `04141211100f0000`.
    HeatSettings,
    8,
    "heat settings"
);

/// Admin thresholds: nine bytes followed by three reserved zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminSettings {
    pub et: [u8; 9],
}

impl AdminSettings {
    pub const SIZE: usize = 12;

    /// A non-zero reserved tail means the layout drifted; it is reported, not masked.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        expect_len("admin settings", Self::SIZE, data)?;
        let trailer = [data[9], data[10], data[11]];
        if trailer != [0, 0, 0] {
            return Err(RecordError::AdminTrailer(trailer));
        }
        let mut et = [0u8; 9];
        et.copy_from_slice(&data[..9]);
        Ok(Self { et })
    }

    pub fn pack(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..9].copy_from_slice(&self.et);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_roundtrip_and_display() {
        let raw = [21, 3, 28, 12, 0, 42];
        let dt = DateTime::unpack(&raw).unwrap();
        assert_eq!(dt.year, 21);
        assert_eq!(dt.second, 42);
        assert_eq!(dt.pack(), raw);
        assert_eq!(dt.to_string(), "21-03-28 12:00:42");
    }

    #[test]
    fn datetime_wrong_length() {
        let err = DateTime::unpack(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            RecordError::Length {
                what: "datetime",
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn blobs_roundtrip_observed_values() {
        let fiber = [
            0x00, 0x00, 0x64, 0x1e, 0x01, 0x14, 0x0c, 0x14, 0x28, 0x1e, 0x01, 0x00, 0x28, 0x8c,
            0x82, 0x00,
        ];
        assert_eq!(FiberSettings::unpack(&fiber).unwrap().pack(), fiber);

        let func = [0x02, 0x00, 0x00, 0x01, 0x01, 0x00, 0x01, 0x01, 0x0a, 0x01, 0x09, 0x00];
        assert_eq!(FiberFunc::unpack(&func).unwrap().pack(), func);

        let heat = [0x04, 0x14, 0x12, 0x11, 0x10, 0x0f, 0x00, 0x00];
        assert_eq!(HeatSettings::unpack(&heat).unwrap().pack(), heat);
    }

    #[test]
    fn blobs_boundary_patterns() {
        for fill in [0x00u8, 0xff, 0xaa] {
            let raw = [fill; 16];
            assert_eq!(FiberSettings::unpack(&raw).unwrap().0, raw);
        }
        assert!(matches!(
            HeatSettings::unpack(&[0u8; 9]),
            Err(RecordError::Length { expected: 8, .. })
        ));
    }

    #[test]
    fn admin_roundtrip() {
        let raw = [0x07, 0x05, 0x07, 0x07, 0x09, 0x05, 0x04, 0x04, 0x12, 0x00, 0x00, 0x00];
        let admin = AdminSettings::unpack(&raw).unwrap();
        assert_eq!(admin.et, [0x07, 0x05, 0x07, 0x07, 0x09, 0x05, 0x04, 0x04, 0x12]);
        assert_eq!(admin.pack(), raw);
    }

    #[test]
    fn admin_nonzero_trailer_fails() {
        let mut raw = [0u8; 12];
        raw[11] = 0x01;
        assert_eq!(
            AdminSettings::unpack(&raw),
            Err(RecordError::AdminTrailer([0, 0, 1]))
        );

        raw[9] = 0xff;
        raw[11] = 0x00;
        assert_eq!(
            AdminSettings::unpack(&raw),
            Err(RecordError::AdminTrailer([0xff, 0, 0]))
        );
    }
}
