//! Numeric command codes carried by `get` and `set` requests.
//!
//! Codes are grouped by the shape of their value:
//!
//! | Range | Shape |
//! |-------|-------|
//! | 10 | session signal bit |
//! | 100-103 | text |
//! | 104-105 | floating point |
//! | 106 | boolean |
//! | 200-202 | width/height pair |
//! | 300 | integer |
//! | 301 | integer range |

use camsync_core::{Error, Result};
use std::fmt;

/// Command codes understood by the device command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i64)]
pub enum CommandCode {
    /// Output bit toggled on every acquired frame.
    SignalBit = 10,
    ImageFormat = 100,
    SensorBitDepth = 101,
    TriggerLine = 102,
    TriggerLineSource = 103,
    ExposureTime = 104,
    AcquisitionFrameRate = 105,
    AcquisitionFrameRateAuto = 106,
    ImageSize = 200,
    ImageOffset = 201,
    SensorSize = 202,
    ThroughputLimit = 300,
    ThroughputLimitRange = 301,
}

impl CommandCode {
    pub const ALL: [CommandCode; 13] = [
        CommandCode::SignalBit,
        CommandCode::ImageFormat,
        CommandCode::SensorBitDepth,
        CommandCode::TriggerLine,
        CommandCode::TriggerLineSource,
        CommandCode::ExposureTime,
        CommandCode::AcquisitionFrameRate,
        CommandCode::AcquisitionFrameRateAuto,
        CommandCode::ImageSize,
        CommandCode::ImageOffset,
        CommandCode::SensorSize,
        CommandCode::ThroughputLimit,
        CommandCode::ThroughputLimitRange,
    ];

    #[inline]
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Human-readable feature name, used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CommandCode::SignalBit => "signal_bit",
            CommandCode::ImageFormat => "image_format",
            CommandCode::SensorBitDepth => "sensor_bit_depth",
            CommandCode::TriggerLine => "trigger_line",
            CommandCode::TriggerLineSource => "trigger_line_source",
            CommandCode::ExposureTime => "exposure_us",
            CommandCode::AcquisitionFrameRate => "acquisition_frame_rate",
            CommandCode::AcquisitionFrameRateAuto => "acquisition_frame_rate_auto",
            CommandCode::ImageSize => "image_size",
            CommandCode::ImageOffset => "image_offset",
            CommandCode::SensorSize => "sensor_size",
            CommandCode::ThroughputLimit => "throughput_limit",
            CommandCode::ThroughputLimitRange => "throughput_limit_range",
        }
    }
}

impl fmt::Display for CommandCode {
    /// Writes the decimal code, which is the wire form.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CommandCode {
    type Err = Error;

    /// Parse the decimal wire form.
    ///
    /// # Errors
    /// Returns `Error::InvalidCommandCode` for non-numeric text and for
    /// numbers outside the table.
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(CommandCode::from_code)
            .ok_or_else(|| Error::InvalidCommandCode(s.to_string()))
    }
}
