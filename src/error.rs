//! Error types for ssewire.

use thiserror::Error;

/// Main error type for all ssewire operations.
#[derive(Debug, Error)]
pub enum SsewireError {
    /// The byte stream does not follow the framing protocol.
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] MalformedFrame),

    /// Accumulated payload grew past the configured limit.
    #[error("Payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: u32 },
}

/// Ways a frame can violate the wire format.
///
/// All of these are fatal for the stream: the parser does not resynchronise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Input ended mid-line, or a CR was not followed by LF.
    #[error("expected a '\\r\\n' line ending")]
    MissingLineTerminator,

    /// A line with nothing before its LF.
    #[error("empty line in event stream")]
    EmptyLine,

    /// First line of a frame has the wrong length.
    #[error("message type line must be 7 bytes, got {length}")]
    InvalidTypeLine { length: usize },

    /// First line of a frame carries an unrecognised type character.
    #[error("unknown message type: {:?}", char::from(*.0))]
    UnknownMessageType(u8),

    /// Bytes follow the blank terminator line.
    #[error("unexpected data after line ending")]
    TrailingData,
}

/// Result type alias using SsewireError.
pub type Result<T> = std::result::Result<T, SsewireError>;
