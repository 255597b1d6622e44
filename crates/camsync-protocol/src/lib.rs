//! Wire protocol of the camera control endpoint.
//!
//! A request or reply is a [`Message`]: an ordered list of UTF-8 text parts.
//! [`MultipartCodec`] frames messages on a byte stream, [`Request`] gives the
//! parts of an inbound message their positional meaning and [`Reply`] lays out
//! the answer.
//!
//! ```text
//! request:  verb [device-id [command-code [arg1 [arg2]]]]
//! reply:    [device-id [command-code]] verb result status ACK|NAC
//! ```

pub mod codec;
pub mod commands;
pub mod message;
pub mod reply;
pub mod request;
pub mod verb;

pub use codec::MultipartCodec;
pub use commands::CommandCode;
pub use message::Message;
pub use reply::{Reply, ReplyBuilder};
pub use request::{RejectedRequest, Request};
pub use verb::Verb;
