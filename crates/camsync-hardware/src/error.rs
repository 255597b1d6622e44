//! Error types for camera and digital-output operations.
//!
//! Every variant maps onto a numeric [`Status`] so a driver failure can be
//! reported to the client unchanged.

use camsync_core::Status;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No device with this identifier is attached.
    #[error("Device not found: {device}")]
    NotFound { device: String },

    /// The handle was closed or never opened.
    #[error("Device not open: {device}")]
    DeviceNotOpen { device: String },

    /// The value is outside what the feature accepts.
    #[error("Invalid value for {feature}: {value}")]
    InvalidValue { feature: String, value: String },

    /// The feature exists but cannot be accessed in the current state.
    #[error("Access denied to {feature}")]
    InvalidAccess { feature: String },

    /// The call is not valid in the current state.
    #[error("Invalid call: {message}")]
    InvalidCall { message: String },

    /// Raw status code reported by a vendor driver.
    #[error("Driver error {code}: {message}")]
    Driver { code: i32, message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::NotFound {
            device: device.into(),
        }
    }

    pub fn device_not_open(device: impl Into<String>) -> Self {
        Self::DeviceNotOpen {
            device: device.into(),
        }
    }

    pub fn invalid_value(feature: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidValue {
            feature: feature.into(),
            value: value.to_string(),
        }
    }

    pub fn invalid_access(feature: impl Into<String>) -> Self {
        Self::InvalidAccess {
            feature: feature.into(),
        }
    }

    pub fn invalid_call(message: impl Into<String>) -> Self {
        Self::InvalidCall {
            message: message.into(),
        }
    }

    pub fn driver(code: i32, message: impl Into<String>) -> Self {
        Self::Driver {
            code,
            message: message.into(),
        }
    }

    /// Reply status for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound { .. } => Status::NOT_FOUND,
            Self::DeviceNotOpen { .. } => Status::DEVICE_NOT_OPEN,
            Self::InvalidValue { .. } => Status::INVALID_VALUE,
            Self::InvalidAccess { .. } => Status::INVALID_ACCESS,
            Self::InvalidCall { .. } => Status::INVALID_CALL,
            Self::Driver { code, .. } => Status::from_code(*code),
            Self::Io(_) => Status::IO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HardwareError::not_found("camA"), -3)]
    #[case(HardwareError::device_not_open("camA"), -5)]
    #[case(HardwareError::invalid_access("LineSource"), -6)]
    #[case(HardwareError::invalid_value("ExposureTime", 0.5), -11)]
    #[case(HardwareError::invalid_call("already capturing"), -15)]
    #[case(HardwareError::driver(-14, "out of resources"), -14)]
    #[case(HardwareError::Io(std::io::Error::other("spawn failed")), -20)]
    fn test_status_mapping(#[case] error: HardwareError, #[case] code: i32) {
        assert_eq!(error.status().code(), code);
    }

    #[test]
    fn test_error_display() {
        let error = HardwareError::invalid_value("PixelFormat", "Bogus");
        assert_eq!(error.to_string(), "Invalid value for PixelFormat: Bogus");

        let error = HardwareError::driver(-6, "camera in use");
        assert_eq!(error.to_string(), "Driver error -6: camera in use");
    }
}
