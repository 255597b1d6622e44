//! Tokio codec for multipart message framing.
//!
//! `MultipartCodec` implements [`Decoder`] and [`Encoder<Message>`] so a TCP
//! stream can be wrapped in a `Framed` and read as a stream of [`Message`]s.
//!
//! # Architecture
//!
//! ```text
//! TCP Stream -> Decoder -> Message (all parts complete)
//! Message -> Encoder -> TCP Stream (count + length-prefixed parts)
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use camsync_protocol::{Message, MultipartCodec};
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> camsync_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:5555").await?;
//! let mut framed = Framed::new(stream, MultipartCodec::new());
//!
//! framed.send(Message::from_parts(["list"])).await?;
//! if let Some(Ok(reply)) = framed.next().await {
//!     println!("Received: {:?}", reply.parts());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Decoding fails when a frame grows past the maximum frame size or a part
//! is not valid UTF-8. An oversized frame is rejected as soon as its header
//! reveals the size, before the body is buffered. A frame with invalid UTF-8
//! is consumed completely, so the byte stream stays aligned. A partial frame
//! left when the peer closes is discarded and the stream simply ends.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::Message;
use crate::message::{PART_COUNT_LEN, PART_LEN_LEN};
use camsync_core::constants::DEFAULT_MAX_FRAME_SIZE;
use camsync_core::{Error, Result};

/// Tokio codec for multipart messages.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::{Decoder, Encoder};
/// use camsync_protocol::{Message, MultipartCodec};
///
/// let mut codec = MultipartCodec::new();
/// let mut buf = BytesMut::new();
/// codec.encode(Message::from_parts(["quit"]), &mut buf).unwrap();
///
/// let decoded = codec.decode(&mut buf).unwrap().unwrap();
/// assert_eq!(decoded.parts(), ["quit"]);
/// ```
#[derive(Debug, Clone)]
pub struct MultipartCodec {
    /// Frames whose encoded size exceeds this are rejected in both directions.
    max_frame_size: usize,
}

impl MultipartCodec {
    /// Create a codec with the default 64 KB frame limit.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom frame limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size,
                max_size: self.max_frame_size,
            });
        }
        Ok(())
    }

    /// Total length of the frame at the head of `src`, or `None` while the
    /// headers needed to know it are still missing.
    fn frame_len(&self, src: &BytesMut) -> Result<Option<usize>> {
        if src.len() < PART_COUNT_LEN {
            return Ok(None);
        }

        let count = u16::from_be_bytes([src[0], src[1]]);
        let mut offset = PART_COUNT_LEN;
        for _ in 0..count {
            let header_end = offset + PART_LEN_LEN;
            self.check_size(header_end)?;
            if src.len() < header_end {
                return Ok(None);
            }

            let len = u32::from_be_bytes([
                src[offset],
                src[offset + 1],
                src[offset + 2],
                src[offset + 3],
            ]) as usize;
            offset = header_end.saturating_add(len);
            self.check_size(offset)?;
        }
        Ok(Some(offset))
    }
}

impl Default for MultipartCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MultipartCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        let Some(frame_len) = self.frame_len(src)? else {
            return Ok(None);
        };
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(frame_len);
        let count = frame.get_u16();
        let mut parts = Vec::with_capacity(usize::from(count));
        let mut valid = true;
        for _ in 0..count {
            let len = frame.get_u32() as usize;
            let bytes = frame.split_to(len);
            match std::str::from_utf8(&bytes) {
                Ok(text) => parts.push(text.to_owned()),
                Err(_) => valid = false,
            }
        }

        if !valid {
            return Err(Error::InvalidMessageFormat(
                "Message part is not valid UTF-8".to_string(),
            ));
        }
        Ok(Some(Message::from(parts)))
    }

    /// A frame cut short by the peer closing is dropped and ends the stream.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => {
                src.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<Message> for MultipartCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        self.check_size(item.encoded_len())?;
        item.encode(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(parts: &[&str]) -> BytesMut {
        let mut buf = BytesMut::new();
        Message::from(parts).encode(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = MultipartCodec::new();
        let mut buf = encoded(&["get", "camA", "104"]);

        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.parts(), ["get", "camA", "104"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_frame_waits() {
        let mut codec = MultipartCodec::new();
        let full = encoded(&["start_capture", "camA"]);

        for cut in 0..full.len() {
            let mut buf = BytesMut::from(&full[..cut]);
            assert!(codec.decode(&mut buf).unwrap().is_none(), "cut at {cut}");
            assert_eq!(buf.len(), cut);
        }
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let mut codec = MultipartCodec::new();
        let mut buf = encoded(&["list"]);
        buf.extend_from_slice(&encoded(&["quit"]));

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().parts(), ["list"]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().parts(), ["quit"]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_empty_message() {
        let mut codec = MultipartCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0][..]);
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert!(msg.is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected_from_header() {
        let mut codec = MultipartCodec::with_max_frame_size(16);
        // One part announcing 1000 bytes, body not yet received.
        let mut buf = BytesMut::from(&[0u8, 1, 0, 0, 0x03, 0xe8][..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { max_size: 16, .. }));
    }

    #[test]
    fn test_invalid_utf8_consumes_frame() {
        let mut codec = MultipartCodec::new();
        let mut buf = BytesMut::from(&[0u8, 1, 0, 0, 0, 2, 0xff, 0xfe][..]);
        buf.extend_from_slice(&encoded(&["list"]));

        assert!(matches!(
            codec.decode(&mut buf),
            Err(Error::InvalidMessageFormat(_))
        ));
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().parts(), ["list"]);
    }

    #[test]
    fn test_partial_frame_at_eof_ends_stream() {
        let mut codec = MultipartCodec::new();
        let full = encoded(&["get", "camA", "104"]);
        let mut buf = encoded(&["list"]);
        buf.extend_from_slice(&full[..full.len() - 2]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap().parts(), ["list"]);
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_respects_limit() {
        let mut codec = MultipartCodec::with_max_frame_size(8);
        let mut buf = BytesMut::new();
        let result = codec.encode(Message::from_parts(["way too long"]), &mut buf);
        assert!(matches!(result, Err(Error::FrameTooLarge { .. })));
        assert!(buf.is_empty());
    }
}
