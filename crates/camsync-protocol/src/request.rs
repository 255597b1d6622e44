//! Positional decoding of inbound requests.
//!
//! ```text
//! quit | list | start_capture_all | stop_capture_all
//! start_capture <device-id>
//! stop_capture  <device-id>
//! get <device-id> <command-code>
//! set <device-id> <command-code> <arg> [<arg>]
//! ```
//!
//! Parts beyond what a verb consumes are ignored, except for `set`, which
//! keeps every remaining part as an argument. The command code stays in its
//! wire text so a reply can echo exactly what the client sent.

use crate::{Message, Reply, Verb};
use camsync_core::{Error, Status};

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Quit,
    List,
    StartCaptureAll,
    StopCaptureAll,
    StartCapture {
        device: String,
    },
    StopCapture {
        device: String,
    },
    Get {
        device: String,
        command: String,
    },
    Set {
        device: String,
        command: String,
        args: Vec<String>,
    },
}

/// A request that could not be decoded, with whatever fields were readable
/// so the rejection can still echo them.
#[derive(Debug)]
pub struct RejectedRequest {
    pub verb: String,
    pub device: Option<String>,
    pub command: Option<String>,
    pub error: Error,
}

impl RejectedRequest {
    fn new(verb: impl Into<String>, error: Error) -> Self {
        Self {
            verb: verb.into(),
            device: None,
            command: None,
            error,
        }
    }

    /// NAC reply for this rejection.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        let status = self.error.status();
        let mut builder = Reply::builder(self.verb).status(status);
        if let Some(device) = self.device {
            builder = builder.device(device);
        }
        if let Some(command) = self.command {
            builder = builder.command(command);
        }
        builder.build()
    }

    pub fn status(&self) -> Status {
        self.error.status()
    }
}

impl Request {
    /// Give the parts of `message` their positional meaning.
    ///
    /// # Errors
    /// Returns a [`RejectedRequest`] when the message is empty, the verb is
    /// unknown or a field the verb requires is missing.
    pub fn decode(message: Message) -> Result<Request, RejectedRequest> {
        let mut parts = message.into_iter();
        let Some(verb_text) = parts.next() else {
            return Err(RejectedRequest::new(
                "",
                Error::InvalidMessageFormat("Empty request".to_string()),
            ));
        };

        let verb = match Verb::parse(&verb_text) {
            Ok(verb) => verb,
            Err(error) => return Err(RejectedRequest::new(verb_text, error)),
        };

        if !verb.targets_device() {
            return Ok(match verb {
                Verb::Quit => Request::Quit,
                Verb::List => Request::List,
                Verb::StartCaptureAll => Request::StartCaptureAll,
                _ => Request::StopCaptureAll,
            });
        }

        let Some(device) = parts.next() else {
            return Err(RejectedRequest::new(
                verb_text,
                Error::MissingField("device-id".to_string()),
            ));
        };

        if !verb.takes_command() {
            return Ok(match verb {
                Verb::StartCapture => Request::StartCapture { device },
                _ => Request::StopCapture { device },
            });
        }

        let Some(command) = parts.next() else {
            let mut rejected =
                RejectedRequest::new(verb_text, Error::MissingField("command-code".to_string()));
            rejected.device = Some(device);
            return Err(rejected);
        };

        if verb == Verb::Get {
            return Ok(Request::Get { device, command });
        }

        let args: Vec<String> = parts.collect();
        if args.is_empty() {
            let mut rejected =
                RejectedRequest::new(verb_text, Error::MissingField("argument".to_string()));
            rejected.device = Some(device);
            rejected.command = Some(command);
            return Err(rejected);
        }
        Ok(Request::Set {
            device,
            command,
            args,
        })
    }

    /// Wire form of this request, for clients.
    #[must_use]
    pub fn encode(&self) -> Message {
        let mut message = Message::new().with(self.verb().as_str());
        if let Some(device) = self.device() {
            message.push(device);
        }
        if let Some(command) = self.command() {
            message.push(command);
        }
        if let Request::Set { args, .. } = self {
            for arg in args {
                message.push(arg.as_str());
            }
        }
        message
    }

    #[must_use]
    pub fn verb(&self) -> Verb {
        match self {
            Request::Quit => Verb::Quit,
            Request::List => Verb::List,
            Request::StartCaptureAll => Verb::StartCaptureAll,
            Request::StopCaptureAll => Verb::StopCaptureAll,
            Request::StartCapture { .. } => Verb::StartCapture,
            Request::StopCapture { .. } => Verb::StopCapture,
            Request::Get { .. } => Verb::Get,
            Request::Set { .. } => Verb::Set,
        }
    }

    /// Device-id field, for verbs that carry one.
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        match self {
            Request::StartCapture { device }
            | Request::StopCapture { device }
            | Request::Get { device, .. }
            | Request::Set { device, .. } => Some(device),
            _ => None,
        }
    }

    /// Command-code field as sent, for `get` and `set`.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Request::Get { command, .. } | Request::Set { command, .. } => Some(command),
            _ => None,
        }
    }

    pub fn get(device: impl Into<String>, command: impl ToString) -> Self {
        Request::Get {
            device: device.into(),
            command: command.to_string(),
        }
    }

    pub fn set<I, S>(device: impl Into<String>, command: impl ToString, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Request::Set {
            device: device.into(),
            command: command.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandCode;
    use rstest::rstest;

    fn decode(parts: &[&str]) -> Result<Request, RejectedRequest> {
        Request::decode(Message::from(parts))
    }

    #[rstest]
    #[case(&["quit"], Request::Quit)]
    #[case(&["list", "ignored"], Request::List)]
    #[case(&["start_capture_all"], Request::StartCaptureAll)]
    #[case(&["stop_capture_all"], Request::StopCaptureAll)]
    #[case(&["start_capture", "camA"], Request::StartCapture { device: "camA".into() })]
    #[case(&["stop_capture", "camB"], Request::StopCapture { device: "camB".into() })]
    #[case(&["get", "camA", "104"], Request::get("camA", CommandCode::ExposureTime))]
    #[case(&["set", "camA", "200", "640", "480"], Request::set("camA", "200", ["640", "480"]))]
    fn test_decode_valid(#[case] parts: &[&str], #[case] expected: Request) {
        assert_eq!(decode(parts).unwrap(), expected);
    }

    #[test]
    fn test_decode_empty_message() {
        let rejected = decode(&[]).unwrap_err();
        assert_eq!(rejected.verb, "");
        assert_eq!(rejected.status(), Status::WRONG_TYPE);
    }

    #[test]
    fn test_decode_unknown_verb_keeps_verb_text() {
        let rejected = decode(&["capture", "camA"]).unwrap_err();
        assert_eq!(rejected.verb, "capture");
        assert!(matches!(rejected.error, Error::UnknownVerb(_)));
        assert!(rejected.device.is_none());
    }

    #[rstest]
    #[case(&["start_capture"], None, None)]
    #[case(&["get", "camA"], Some("camA"), None)]
    #[case(&["set", "camA", "104"], Some("camA"), Some("104"))]
    fn test_decode_missing_fields(
        #[case] parts: &[&str],
        #[case] device: Option<&str>,
        #[case] command: Option<&str>,
    ) {
        let rejected = decode(parts).unwrap_err();
        assert!(matches!(rejected.error, Error::MissingField(_)));
        assert_eq!(rejected.device.as_deref(), device);
        assert_eq!(rejected.command.as_deref(), command);
    }

    #[test]
    fn test_rejection_reply_echoes_fields() {
        let reply = decode(&["set", "camA", "104"]).unwrap_err().into_reply();
        assert_eq!(
            reply.to_message().parts(),
            ["camA", "104", "set", "None", "-10", "NAC"]
        );
    }

    #[test]
    fn test_encode_matches_decode() {
        let request = Request::set("camA", CommandCode::ImageOffset, ["8", "16"]);
        let message = request.encode();
        assert_eq!(message.parts(), ["set", "camA", "201", "8", "16"]);
        assert_eq!(Request::decode(message).unwrap(), request);
    }
}
