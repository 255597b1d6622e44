use crate::Status;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Unknown verb: {0}")]
    UnknownVerb(String),

    #[error("Invalid command code: {0}")]
    InvalidCommandCode(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Reply status for this error.
    ///
    /// Every malformed-request error collapses to [`Status::WRONG_TYPE`];
    /// transport failures are reported the same way.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Error::Io(_) => Status::IO,
            _ => Status::WRONG_TYPE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::UnknownVerb("frobnicate".into()))]
    #[case(Error::InvalidCommandCode("abc".into()))]
    #[case(Error::MissingField("device-id".into()))]
    #[case(Error::InvalidMessageFormat("empty".into()))]
    #[case(Error::FrameTooLarge { size: 10, max_size: 5 })]
    fn test_protocol_errors_map_to_wrong_type(#[case] error: Error) {
        assert_eq!(error.status(), Status::WRONG_TYPE);
    }

    #[test]
    fn test_error_display() {
        let error = Error::FrameTooLarge {
            size: 70_000,
            max_size: 65_536,
        };
        assert_eq!(error.to_string(), "Frame too large: 70000 bytes (max 65536)");
        assert_eq!(
            Error::from(std::io::Error::other("reset")).status(),
            Status::IO
        );
    }
}
