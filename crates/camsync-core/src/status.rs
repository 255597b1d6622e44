//! Reply status codes.
//!
//! Status values share the numeric space of the camera SDK error codes, so a
//! driver failure can be forwarded to the client verbatim. `0` is success and
//! every failure is negative.
//!
//! | Code | Name |
//! |------|------|
//! | 0 | success |
//! | -1 | internal fault |
//! | -3 | not found |
//! | -4 | bad handle |
//! | -5 | device not open |
//! | -6 | invalid access |
//! | -7 | bad parameter |
//! | -10 | wrong type |
//! | -11 | invalid value |
//! | -12 | timeout |
//! | -13 | other |
//! | -15 | invalid call |
//! | -18 | not supported |
//! | -20 | I/O |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply status tag for an acknowledged request.
pub const ACK: &str = "ACK";

/// Reply status tag for a rejected request.
pub const NAC: &str = "NAC";

/// Numeric status carried in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(i32);

impl Status {
    pub const SUCCESS: Status = Status(0);
    pub const INTERNAL_FAULT: Status = Status(-1);
    pub const NOT_FOUND: Status = Status(-3);
    pub const BAD_HANDLE: Status = Status(-4);
    pub const DEVICE_NOT_OPEN: Status = Status(-5);
    pub const INVALID_ACCESS: Status = Status(-6);
    pub const BAD_PARAMETER: Status = Status(-7);
    /// Also used for malformed requests and unknown command codes.
    pub const WRONG_TYPE: Status = Status(-10);
    pub const INVALID_VALUE: Status = Status(-11);
    pub const TIMEOUT: Status = Status(-12);
    pub const OTHER: Status = Status(-13);
    pub const INVALID_CALL: Status = Status(-15);
    pub const NOT_SUPPORTED: Status = Status(-18);
    pub const IO: Status = Status(-20);

    /// Wrap a raw driver code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Status(code)
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// `ACK` for success, `NAC` otherwise.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        if self.is_success() { ACK } else { NAC }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        s.trim()
            .parse::<i32>()
            .map(Status)
            .map_err(|_| crate::Error::InvalidMessageFormat(format!("Invalid status code: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Status::SUCCESS, "0", "ACK")]
    #[case(Status::NOT_FOUND, "-3", "NAC")]
    #[case(Status::WRONG_TYPE, "-10", "NAC")]
    #[case(Status::from_code(-42), "-42", "NAC")]
    fn test_status_text(#[case] status: Status, #[case] text: &str, #[case] tag: &str) {
        assert_eq!(status.to_string(), text);
        assert_eq!(status.tag(), tag);
        assert_eq!(text.parse::<Status>().unwrap(), status);
    }

    #[test]
    fn test_status_parse_rejects_garbage() {
        assert!("ok".parse::<Status>().is_err());
    }
}
