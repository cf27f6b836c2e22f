//! Wire format constants and line-level decoding.
//!
//! A frame is a run of CRLF-terminated lines closed by an empty line:
//! ```text
//! data: T\r\n          <- type line: "data: " + one type character
//! data: hello \r\n     <- payload line: content after the first space
//! data: world\r\n
//! \r\n                 <- terminator
//! ```
//!
//! Payload chunks are concatenated without separators, so the frame above
//! carries `hello world`.

use std::fmt;

use crate::error::MalformedFrame;

/// Carriage return.
pub const CR: u8 = b'\r';

/// Line feed.
pub const LF: u8 = b'\n';

/// Separator between the `data:` prefix and line content.
pub const SPACE: u8 = b' ';

/// Prefix carried by every non-empty line.
pub const DATA_PREFIX: &[u8] = b"data: ";

/// Length of a type line without its CRLF (prefix + one type character).
pub const TYPE_LINE_LEN: usize = DATA_PREFIX.len() + 1;

/// Default maximum payload size (1 GB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u32 = 1_073_741_824;

/// Kind of application message carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Binary,
    Close,
    Error,
}

impl MessageType {
    /// Map a wire type character to a message type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'T' => Some(Self::Text),
            b'B' => Some(Self::Binary),
            b'C' => Some(Self::Close),
            b'E' => Some(Self::Error),
            _ => None,
        }
    }

    /// The wire type character.
    pub fn code(self) -> u8 {
        match self {
            Self::Text => b'T',
            Self::Binary => b'B',
            Self::Close => b'C',
            Self::Error => b'E',
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Binary => "Binary",
            Self::Close => "Close",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Decode the first line of a frame (CRLF already stripped).
///
/// Only the length and the final byte are checked; the prefix itself is not
/// validated.
///
/// # Example
///
/// ```
/// use ssewire::protocol::{parse_type_line, MessageType};
///
/// assert_eq!(parse_type_line(b"data: B").unwrap(), MessageType::Binary);
/// assert!(parse_type_line(b"data: BB").is_err());
/// ```
pub fn parse_type_line(line: &[u8]) -> std::result::Result<MessageType, MalformedFrame> {
    if line.len() != TYPE_LINE_LEN {
        return Err(MalformedFrame::InvalidTypeLine { length: line.len() });
    }
    let code = line[TYPE_LINE_LEN - 1];
    MessageType::from_code(code).ok_or(MalformedFrame::UnknownMessageType(code))
}

/// Extract the chunk carried by a payload line (CRLF already stripped).
///
/// Everything after the first space is returned verbatim. A line with no
/// space at all is returned whole.
#[inline]
pub fn payload_chunk(line: &[u8]) -> &[u8] {
    match memchr::memchr(SPACE, line) {
        Some(idx) => &line[idx + 1..],
        None => line,
    }
}
