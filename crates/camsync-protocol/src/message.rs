use bytes::{BufMut, BytesMut};
use camsync_core::{Error, Result};

/// Size of the part-count prefix of a frame.
pub const PART_COUNT_LEN: usize = 2;

/// Size of the length prefix in front of every part.
pub const PART_LEN_LEN: usize = 4;

/// Ordered list of text parts exchanged as one unit.
///
/// # Wire format
///
/// ```text
/// u16 BE part count | (u32 BE length | UTF-8 bytes) * count
/// ```
///
/// # Example
/// ```
/// use camsync_protocol::Message;
///
/// let msg = Message::new().with("get").with("camA").with("104");
/// assert_eq!(msg.len(), 3);
/// assert_eq!(msg.parts()[1], "camA");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    parts: Vec<String>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a message from any sequence of string-like parts.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a part.
    pub fn push(&mut self, part: impl Into<String>) {
        self.parts.push(part.into());
    }

    /// Append a part, builder style.
    #[must_use]
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.push(part);
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<String> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of bytes this message occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        PART_COUNT_LEN
            + self
                .parts
                .iter()
                .map(|part| PART_LEN_LEN + part.len())
                .sum::<usize>()
    }

    /// Append the wire form of this message to `dst`.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessageFormat` if the message has more parts
    /// than the count prefix can express or a part is longer than `u32::MAX`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let count = u16::try_from(self.parts.len()).map_err(|_| {
            Error::InvalidMessageFormat(format!("Too many parts: {}", self.parts.len()))
        })?;

        let lengths = self
            .parts
            .iter()
            .map(|part| {
                u32::try_from(part.len()).map_err(|_| {
                    Error::InvalidMessageFormat(format!("Part too long: {} bytes", part.len()))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        dst.reserve(self.encoded_len());
        dst.put_u16(count);
        for (part, len) in self.parts.iter().zip(lengths) {
            dst.put_u32(len);
            dst.put_slice(part.as_bytes());
        }
        Ok(())
    }
}

impl From<Vec<String>> for Message {
    fn from(parts: Vec<String>) -> Self {
        Self { parts }
    }
}

impl From<&[&str]> for Message {
    fn from(parts: &[&str]) -> Self {
        Self::from_parts(parts.iter().copied())
    }
}

impl IntoIterator for Message {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}
