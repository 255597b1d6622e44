use camsync_core::{Error, Result};
use std::fmt;

/// Request verb, the first part of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Stop the server after replying.
    Quit,
    /// Report the keys of all registered devices.
    List,
    StartCaptureAll,
    StopCaptureAll,
    StartCapture,
    StopCapture,
    Get,
    Set,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::Quit,
        Verb::List,
        Verb::StartCaptureAll,
        Verb::StopCaptureAll,
        Verb::StartCapture,
        Verb::StopCapture,
        Verb::Get,
        Verb::Set,
    ];

    /// Wire spelling of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Quit => "quit",
            Verb::List => "list",
            Verb::StartCaptureAll => "start_capture_all",
            Verb::StopCaptureAll => "stop_capture_all",
            Verb::StartCapture => "start_capture",
            Verb::StopCapture => "stop_capture",
            Verb::Get => "get",
            Verb::Set => "set",
        }
    }

    /// Parse the wire spelling. Matching is exact and case-sensitive.
    ///
    /// # Errors
    /// Returns `Error::UnknownVerb` for anything not listed in [`Verb::ALL`].
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| Error::UnknownVerb(s.to_string()))
    }

    /// Returns `true` if the verb addresses a single device.
    #[must_use]
    pub const fn targets_device(self) -> bool {
        matches!(
            self,
            Verb::StartCapture | Verb::StopCapture | Verb::Get | Verb::Set
        )
    }

    /// Returns `true` if the verb carries a command code.
    #[must_use]
    pub const fn takes_command(self) -> bool {
        matches!(self, Verb::Get | Verb::Set)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Verb::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_every_verb_parses_its_own_spelling() {
        for verb in Verb::ALL {
            assert_eq!(Verb::parse(verb.as_str()).unwrap(), verb);
        }
    }

    #[rstest]
    #[case("QUIT")]
    #[case("start")]
    #[case("")]
    #[case(" get")]
    fn test_unknown_verbs(#[case] input: &str) {
        assert!(matches!(Verb::parse(input), Err(Error::UnknownVerb(_))));
    }

    #[test]
    fn test_verb_shape() {
        assert!(Verb::Set.targets_device());
        assert!(Verb::Set.takes_command());
        assert!(Verb::StartCapture.targets_device());
        assert!(!Verb::StartCapture.takes_command());
        assert!(!Verb::StartCaptureAll.targets_device());
        assert!(!Verb::List.targets_device());
    }
}
