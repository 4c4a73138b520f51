//! The closed opcode table.
//!
//! Several codes were observed on the wire without a known meaning; they keep
//! placeholder names so they can still be sent and matched.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FrameError;

macro_rules! opcodes {
    ($($(#[$doc:meta])* $variant:ident = $value:literal => $name:literal,)+) => {
        /// One-byte operation identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(into = "&'static str")]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[$doc])* $variant = $value,)+
        }

        impl Opcode {
            /// Every known opcode, in wire-value order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)+];

            /// Protocol name, e.g. `GET_SERIAL`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)+
                }
            }
        }

        impl TryFrom<u8> for Opcode {
            type Error = FrameError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Opcode::$variant),)+
                    other => Err(FrameError::UnknownOpcode(other)),
                }
            }
        }
    };
}

opcodes! {
    /// Firmware related, meaning unknown.
    Unknown4 = 0x00 => "UNKNOWN_4",
    SetFiberSettings = 0x10 => "SET_FIBER_SETTINGS",
    GetFiberSettings = 0x11 => "GET_FIBER_SETTINGS",
    SetFiberFunc = 0x12 => "SET_FIBER_FUNC",
    GetFiberFunc = 0x13 => "GET_FIBER_FUNC",
    SetHeatTime = 0x14 => "SET_HEAT_TIME",
    GetHeatTime = 0x15 => "GET_HEAT_TIME",
    SetFiberAdmin = 0x16 => "SET_FIBER_ADMIN",
    GetFiberAdmin = 0x17 => "GET_FIBER_ADMIN",
    SetAio = 0x19 => "SET_AIO",
    GetAio = 0x20 => "GET_AIO",
    /// Mark a record as read.
    SetRecordRead = 0x21 => "SET_RECORD_READ",
    /// One chunk of a multi-part image transfer.
    GetRecordImg = 0x22 => "GET_RECORD_IMG",
    /// Record metadata, sent in reply to [`Opcode::GetRecord`].
    GetCurrentRecord = 0x23 => "GET_CURRENT_RECORD",
    GetTotalCount = 0x25 => "GET_TOTAL_COUNT",
    Unknown = 0x26 => "UNKNOWN",
    /// Number of splices.
    GetCurrentCount = 0x27 => "GET_CURRENT_COUNT",
    Unknown1 = 0x32 => "UNKNOWN_1",
    Unknown2 = 0x33 => "UNKNOWN_2",
    Unknown3 = 0x34 => "UNKNOWN_3",
    GetSerial = 0x35 => "GET_SERIAL",
    /// Device clock, `YMDhms`.
    GetDatetime = 0x39 => "GET_DATETIME",
    SetFactoryMenuCall = 0x41 => "SET_FACTORY_MENU_CALL",
    /// Normal, manual or arc calibration mode.
    SetMode = 0x42 => "SET_MODE",
    GetMode = 0x43 => "GET_MODE",
    /// Firmware upgrade test.
    Unknown6 = 0x44 => "UNKNOWN_6",
    SetConnected = 0x45 => "SET_CONNECTED",
    /// Unsolicited device event.
    GetAsync = 0x48 => "GET_ASYNC",
    /// Index of the newest stored record.
    GetRecordLast = 0x49 => "GET_RECORD_LAST",
    GetRecord = 0x4a => "GET_RECORD",
    SetRecordClear = 0x4b => "SET_RECORD_CLEAR",
    SetOpmVflPowerdown = 0xa0 => "SET_OPM_VFL_POWERDOWN",
    SetOpmUnits = 0xa1 => "SET_OPM_UNITS",
    GetOpm = 0xa2 => "GET_OPM",
    SetVflMode = 0xa3 => "SET_VFL_MODE",
    SetOpmWavelength = 0xa4 => "SET_OPM_WAVELENGTH",
    Unknown5 = 0xa6 => "UNKNOWN_5",
    MoveMotor = 0xe0 => "MOVE_MOTOR",
    SetArc = 0xe1 => "SET_ARC",
    SetMotorReset = 0xe2 => "SET_MOTOR_RESET",
    SetClean = 0xe3 => "SET_CLEAN",
    SetContinue = 0xe9 => "SET_CONTINUE",
    SetFirmwareData = 0xf0 => "SET_FIRMWARE_DATA",
    Unknown7 = 0xf1 => "UNKNOWN_7",
    Unknown8 = 0xf2 => "UNKNOWN_8",
}

impl Opcode {
    /// Wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op as u8
    }
}

impl From<Opcode> for &'static str {
    fn from(op: Opcode) -> Self {
        op.name()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a protocol name (case-insensitive) or a hex value like `0x35`.
impl FromStr for Opcode {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let value = u8::from_str_radix(hex, 16)
                .map_err(|_| FrameError::UnknownOpcodeName(s.to_string()))?;
            return Opcode::try_from(value);
        }

        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FrameError::UnknownOpcodeName(s.to_string()))
    }
}
