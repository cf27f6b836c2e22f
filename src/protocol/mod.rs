//! Protocol module - wire format, cursors, and the resumable decoder.
//!
//! This module implements the `data:` line framing:
//! - Wire constants and message type codes
//! - Segmented read buffer with position cursors
//! - Three-state parser that resumes across partial reads
//! - Message buffer that drives the parser over owned bytes

mod message;
mod message_buffer;
mod parser;
mod read_buffer;
mod wire_format;

pub use message::Message;
pub use message_buffer::{MessageBuffer, DEFAULT_BUFFER_CAPACITY};
pub use parser::{MessageParser, ParseResult, Parsed};
pub use read_buffer::{Position, ReadBuffer};
pub use wire_format::{
    parse_type_line, payload_chunk, MessageType, CR, DATA_PREFIX, DEFAULT_MAX_PAYLOAD_SIZE, LF,
    SPACE, TYPE_LINE_LEN,
};
