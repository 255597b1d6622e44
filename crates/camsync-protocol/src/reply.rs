use crate::{Message, Request};
use camsync_core::constants::REPLY_NONE;
use camsync_core::status::{ACK, NAC};
use camsync_core::{Error, Result, Status};

/// Answer to one request.
///
/// Parts on the wire, in order:
///
/// ```text
/// [device-id] [command-code] verb result status ACK|NAC
/// ```
///
/// The command code is only written when a device id is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub device: Option<String>,
    pub command: Option<String>,
    pub verb: String,
    /// Formatted value, or `"None"` when the request produces none.
    pub result: String,
    pub status: Status,
}

impl Reply {
    /// Start a reply for the given verb text.
    pub fn builder(verb: impl Into<String>) -> ReplyBuilder {
        ReplyBuilder::new(verb)
    }

    /// Start a reply that echoes the verb, device id and command code of `request`.
    pub fn for_request(request: &Request) -> ReplyBuilder {
        let mut builder = ReplyBuilder::new(request.verb().as_str());
        if let Some(device) = request.device() {
            builder = builder.device(device);
        }
        if let Some(command) = request.command() {
            builder = builder.command(command);
        }
        builder
    }

    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn to_message(&self) -> Message {
        let mut message = Message::new();
        if let Some(device) = &self.device {
            message.push(device.as_str());
            if let Some(command) = &self.command {
                message.push(command.as_str());
            }
        }
        message.push(self.verb.as_str());
        message.push(self.result.as_str());
        message.push(self.status.to_string());
        message.push(self.status.tag());
        message
    }

    /// Parse a reply received by a client.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessageFormat` if the message does not have
    /// between four and six parts, the status is not numeric or the tag
    /// disagrees with the status.
    pub fn from_message(message: Message) -> Result<Reply> {
        let mut parts = message.into_parts();
        if !(4..=6).contains(&parts.len()) {
            return Err(Error::InvalidMessageFormat(format!(
                "Reply has {} parts, expected 4 to 6",
                parts.len()
            )));
        }

        let tail = parts.split_off(parts.len() - 4);
        let [verb, result, status, tag]: [String; 4] = tail.try_into().map_err(|_| {
            Error::InvalidMessageFormat("Reply tail must have 4 parts".to_string())
        })?;

        let status: Status = status.parse()?;
        let expected_tag = if status.is_success() { ACK } else { NAC };
        if tag != expected_tag {
            return Err(Error::InvalidMessageFormat(format!(
                "Tag {tag} does not match status {status}"
            )));
        }

        let mut prefix = parts.into_iter();
        Ok(Reply {
            device: prefix.next(),
            command: prefix.next(),
            verb,
            result,
            status,
        })
    }
}

/// Fluent builder for [`Reply`].
///
/// # Example
/// ```
/// use camsync_protocol::Reply;
/// use camsync_core::Status;
///
/// let reply = Reply::builder("get")
///     .device("camA")
///     .command("104")
///     .result("5000.000000")
///     .build();
/// assert_eq!(reply.status, Status::SUCCESS);
/// assert_eq!(
///     reply.to_message().parts(),
///     ["camA", "104", "get", "5000.000000", "0", "ACK"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    device: Option<String>,
    command: Option<String>,
    verb: String,
    result: Option<String>,
    status: Status,
}

impl ReplyBuilder {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            device: None,
            command: None,
            verb: verb.into(),
            result: None,
            status: Status::SUCCESS,
        }
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Reply {
        Reply {
            device: self.device,
            command: self.command,
            verb: self.verb,
            result: self.result.unwrap_or_else(|| REPLY_NONE.to_string()),
            status: self.status,
        }
    }
}
