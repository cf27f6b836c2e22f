//! Message buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` to hold bytes the parser has not consumed yet and
//! drives a [`MessageParser`] over them. After every push the consumed prefix
//! is split off, so only the unfinished tail of a frame stays buffered.
//!
//! # Example
//!
//! ```
//! use ssewire::protocol::MessageBuffer;
//!
//! let mut buffer = MessageBuffer::new();
//!
//! // Data arrives in chunks from the transport
//! assert!(buffer.push(b"data: T\r\ndata: hel").unwrap().is_none());
//! let message = buffer.push(b"lo\r\n\r\n").unwrap().unwrap();
//!
//! assert_eq!(message.payload(), b"hello");
//! assert!(buffer.finish().unwrap().is_none());
//! ```

use bytes::BytesMut;

use super::message::Message;
use super::parser::MessageParser;
use super::read_buffer::ReadBuffer;
use super::wire_format::DEFAULT_MAX_PAYLOAD_SIZE;
use crate::error::Result;

/// Default buffer capacity (64KB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Buffer for accumulating incoming bytes and extracting complete messages.
pub struct MessageBuffer {
    /// Bytes received but not yet consumed by the parser.
    buffer: BytesMut,
    /// Parser state carried between pushes.
    parser: MessageParser,
}

impl MessageBuffer {
    /// Create a new message buffer with default settings.
    ///
    /// Default capacity: 64KB, max payload: 1GB.
    pub fn new() -> Self {
        Self::with_capacity_and_max_payload(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new message buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self::with_capacity_and_max_payload(DEFAULT_BUFFER_CAPACITY, max_payload_size)
    }

    /// Create a new message buffer with custom capacity and max payload.
    pub fn with_capacity_and_max_payload(capacity: usize, max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            parser: MessageParser::with_max_payload(max_payload_size),
        }
    }

    /// Push data into the buffer and extract a complete message, if any.
    ///
    /// A decode window may hold at most one frame: bytes following a
    /// complete frame in the same push are rejected as trailing data.
    ///
    /// # Errors
    ///
    /// Returns error if the stream is malformed or the payload exceeds
    /// max_payload_size.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<Message>> {
        self.buffer.extend_from_slice(data);
        self.advance(false)
    }

    /// Signal end of stream and flush whatever is buffered.
    ///
    /// Returns `Ok(None)` at a clean frame boundary. A truncated frame is an
    /// error.
    pub fn finish(&mut self) -> Result<Option<Message>> {
        if self.buffer.is_empty() && self.parser.is_idle() {
            return Ok(None);
        }
        self.advance(true)
    }

    fn advance(&mut self, eof: bool) -> Result<Option<Message>> {
        let parsed = self
            .parser
            .parse(&ReadBuffer::new(&self.buffer).with_eof(eof))?;

        // Consume parsed lines
        let _ = self.buffer.split_to(parsed.consumed.offset());

        Ok(parsed.into_message())
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset the parser.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.parser.reset();
    }

    /// Access the underlying parser.
    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}
