//! Resumable frame decoder.
//!
//! Implements a line-by-line state machine that survives frames split
//! arbitrarily across reads:
//! - `ReadMessageType`: waiting for the `data: X` type line
//! - `ReadMessagePayload`: collecting `data: ...` payload lines
//! - `ReadEndOfMessage`: waiting for the empty terminator line
//!
//! Each call to [`MessageParser::parse`] reports two cursors. `consumed` marks
//! the end of the last fully processed line; the caller drops those bytes and
//! resubmits the rest together with newly read data. `examined` marks how far
//! the parser looked, so the caller knows not to retry before more bytes
//! arrive.
//!
//! # Example
//!
//! ```
//! use ssewire::protocol::{MessageParser, MessageType, ParseResult, ReadBuffer};
//!
//! let mut parser = MessageParser::new();
//!
//! let data = b"data: T\r\ndata: Hel";
//! let parsed = parser.parse(&ReadBuffer::new(data)).unwrap();
//! assert!(matches!(parsed.result, ParseResult::Incomplete));
//!
//! // Drop what was consumed, append the rest of the stream.
//! let mut rest = data[parsed.consumed.offset()..].to_vec();
//! rest.extend_from_slice(b"lo\r\n\r\n");
//!
//! let parsed = parser.parse(&ReadBuffer::new(&rest)).unwrap();
//! match parsed.result {
//!     ParseResult::Completed(message) => {
//!         assert_eq!(message.message_type(), MessageType::Text);
//!         assert_eq!(message.payload(), b"Hello");
//!     }
//!     ParseResult::Incomplete => unreachable!(),
//! }
//! ```

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

use super::message::Message;
use super::read_buffer::{Position, ReadBuffer};
use super::wire_format::{
    parse_type_line, payload_chunk, MessageType, CR, DEFAULT_MAX_PAYLOAD_SIZE, LF,
};
use crate::error::{MalformedFrame, Result, SsewireError};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting the type line that opens a frame.
    ReadMessageType,
    /// Type known, collecting payload lines.
    ReadMessagePayload,
    /// Next line is the blank terminator.
    ReadEndOfMessage,
}

/// Outcome of a single [`MessageParser::parse`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// A full frame was decoded.
    Completed(Message),
    /// Valid so far; call again once more bytes are available.
    Incomplete,
}

/// Cursors and outcome reported by [`MessageParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Bytes before this cursor are fully parsed and may be discarded.
    pub consumed: Position,
    /// Bytes before this cursor have been looked at.
    pub examined: Position,
    pub result: ParseResult,
}

impl Parsed {
    /// Returns the message if the frame completed.
    pub fn into_message(self) -> Option<Message> {
        match self.result {
            ParseResult::Completed(message) => Some(message),
            ParseResult::Incomplete => None,
        }
    }
}

/// Incremental decoder for one stream.
///
/// Keeps the state of a partially received frame between calls. Create one
/// per connection and feed it sequentially.
#[derive(Debug)]
pub struct MessageParser {
    /// Current parsing state.
    state: State,
    /// Type of the frame being assembled.
    message_type: Option<MessageType>,
    /// Payload chunks collected so far, each an owned copy of its line.
    pending: Vec<Bytes>,
    /// Sum of `pending` lengths.
    pending_len: usize,
    /// Maximum allowed payload size.
    max_payload_size: u32,
}

impl MessageParser {
    /// Create a new parser with the default payload limit (1GB).
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new parser with a custom payload limit.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            state: State::ReadMessageType,
            message_type: None,
            pending: Vec::new(),
            pending_len: 0,
            max_payload_size,
        }
    }

    /// Parse as much of `buf` as possible, yielding at most one message.
    ///
    /// `buf` must start where the previous call's `consumed` cursor pointed.
    ///
    /// # Errors
    ///
    /// Returns [`SsewireError::MalformedFrame`] if the bytes violate the wire
    /// format, including a partial line when `buf` is at EOF, and
    /// [`SsewireError::PayloadTooLarge`] if the payload limit is exceeded.
    /// Errors are fatal for the stream.
    pub fn parse(&mut self, buf: &ReadBuffer<'_>) -> Result<Parsed> {
        let mut consumed = buf.start();

        loop {
            // A CR opening the next line means the frame is ending. This also
            // covers a previous call that stopped right after a payload line.
            if self.state == State::ReadMessagePayload && buf.byte_at(consumed) == Some(CR) {
                self.transition(State::ReadEndOfMessage);
            }

            match self.state {
                State::ReadEndOfMessage => return self.read_end_of_message(buf, consumed),
                State::ReadMessageType => {
                    let Some((line, line_end)) = read_line(buf, consumed)? else {
                        return incomplete(buf, consumed);
                    };
                    let message_type = parse_type_line(&line).map_err(reject)?;
                    tracing::trace!(%message_type, "frame started");
                    self.message_type = Some(message_type);
                    self.transition(State::ReadMessagePayload);
                    consumed = line_end;
                }
                State::ReadMessagePayload => {
                    let Some((line, line_end)) = read_line(buf, consumed)? else {
                        return incomplete(buf, consumed);
                    };
                    self.push_chunk(payload_chunk(&line))?;
                    consumed = line_end;
                }
            }
        }
    }

    /// Abandon any partial frame and wait for a new type line.
    pub fn reset(&mut self) {
        self.state = State::ReadMessageType;
        self.message_type = None;
        self.pending.clear();
        self.pending_len = 0;
    }

    /// True when positioned between frames with nothing pending.
    pub fn is_idle(&self) -> bool {
        self.state == State::ReadMessageType && self.pending.is_empty()
    }

    /// Payload bytes collected for the current frame.
    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    /// Configured payload limit.
    pub fn max_payload_size(&self) -> u32 {
        self.max_payload_size
    }

    fn transition(&mut self, next: State) {
        tracing::trace!(from = ?self.state, to = ?next, "parser state change");
        self.state = next;
    }

    fn push_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let size = self.pending_len + chunk.len();
        if size > self.max_payload_size as usize {
            tracing::debug!(size, max = self.max_payload_size, "payload limit exceeded");
            return Err(SsewireError::PayloadTooLarge {
                size,
                max: self.max_payload_size,
            });
        }
        self.pending.push(Bytes::copy_from_slice(chunk));
        self.pending_len = size;
        Ok(())
    }

    /// Expects `consumed` to sit on the CR of the terminator line.
    fn read_end_of_message(&mut self, buf: &ReadBuffer<'_>, consumed: Position) -> Result<Parsed> {
        let lf_pos = consumed.advance(1);
        match buf.byte_at(lf_pos) {
            // The frame ended with "\r\n\r"; wait for the final LF.
            None => return incomplete(buf, consumed),
            Some(LF) => {}
            Some(_) => return Err(reject(MalformedFrame::MissingLineTerminator)),
        }

        if lf_pos.advance(1) != buf.end() {
            return Err(reject(MalformedFrame::TrailingData));
        }

        let message = self.take_message();
        tracing::trace!(
            message_type = %message.message_type,
            payload_len = message.payload_len(),
            "frame completed"
        );
        self.transition(State::ReadMessageType);

        Ok(Parsed {
            consumed: buf.end(),
            examined: buf.end(),
            result: ParseResult::Completed(message),
        })
    }

    /// Drain pending chunks into one contiguous payload.
    fn take_message(&mut self) -> Message {
        let message_type = self.message_type.take().unwrap_or(MessageType::Text);
        let total = std::mem::take(&mut self.pending_len);

        let payload = match self.pending.len() {
            0 => Bytes::new(),
            1 => self.pending.pop().unwrap_or_default(),
            _ => {
                let mut payload = BytesMut::with_capacity(total);
                for chunk in self.pending.drain(..) {
                    payload.extend_from_slice(&chunk);
                }
                payload.freeze()
            }
        };

        Message::new(message_type, payload)
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::ReadMessageType => "ReadMessageType",
            State::ReadMessagePayload => "ReadMessagePayload",
            State::ReadEndOfMessage => "ReadEndOfMessage",
        }
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one CRLF-terminated line starting at `from`.
///
/// Returns the line content without CRLF and the cursor just past the LF, or
/// `None` if no LF is available yet.
fn read_line<'a>(
    buf: &ReadBuffer<'a>,
    from: Position,
) -> Result<Option<(Cow<'a, [u8]>, Position)>> {
    let Some(lf) = buf.seek(from, LF) else {
        return Ok(None);
    };

    let line_end = lf.advance(1);
    if from.distance_to(line_end) < 2 {
        return Err(reject(MalformedFrame::EmptyLine));
    }

    let cr = from.advance(from.distance_to(lf) - 1);
    if buf.byte_at(cr) != Some(CR) {
        return Err(reject(MalformedFrame::MissingLineTerminator));
    }

    Ok(Some((buf.slice(from, cr), line_end)))
}

/// Not enough data for the next line.
fn incomplete(buf: &ReadBuffer<'_>, consumed: Position) -> Result<Parsed> {
    if buf.is_eof() {
        return Err(reject(MalformedFrame::MissingLineTerminator));
    }
    Ok(Parsed {
        consumed,
        examined: buf.end(),
        result: ParseResult::Incomplete,
    })
}

fn reject(err: MalformedFrame) -> SsewireError {
    tracing::debug!(error = %err, "rejecting malformed frame");
    SsewireError::MalformedFrame(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_bytes(parser: &mut MessageParser, data: &[u8]) -> Result<Parsed> {
        parser.parse(&ReadBuffer::new(data))
    }

    fn completed(parsed: Parsed) -> Message {
        match parsed.result {
            ParseResult::Completed(message) => message,
            ParseResult::Incomplete => panic!("expected a completed frame"),
        }
    }

    fn malformed(result: Result<Parsed>) -> MalformedFrame {
        match result {
            Err(SsewireError::MalformedFrame(err)) => err,
            other => panic!("expected malformed frame, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_payload() {
        let mut parser = MessageParser::new();
        let data = b"data: T\r\ndata: Hello, World\r\n\r\n";

        let parsed = parse_bytes(&mut parser, data).unwrap();

        assert_eq!(parsed.consumed.offset(), data.len());
        assert_eq!(parsed.examined.offset(), data.len());
        let message = completed(parsed);
        assert_eq!(message.message_type(), MessageType::Text);
        assert_eq!(message.payload(), b"Hello, World");
    }

    #[test]
    fn test_multiple_payload_lines_concatenate() {
        let mut parser = MessageParser::new();
        let data = b"data: B\r\ndata: ab\r\ndata: c d\r\ndata: \r\ndata: e\r\n\r\n";

        let message = completed(parse_bytes(&mut parser, data).unwrap());

        assert!(message.is_binary());
        assert_eq!(message.payload(), b"abc de");
    }

    #[test]
    fn test_empty_payload() {
        let mut parser = MessageParser::new();

        let message = completed(parse_bytes(&mut parser, b"data: T\r\n\r\n").unwrap());

        assert_eq!(message, Message::from_parts(MessageType::Text, b""));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_all_message_types() {
        for (code, expected) in [
            (b'T', MessageType::Text),
            (b'B', MessageType::Binary),
            (b'C', MessageType::Close),
            (b'E', MessageType::Error),
        ] {
            let mut parser = MessageParser::new();
            let data = [&b"data: "[..], &[code][..], &b"\r\n\r\n"[..]].concat();

            let message = completed(parse_bytes(&mut parser, &data).unwrap());
            assert_eq!(message.message_type(), expected);
        }
    }

    #[test]
    fn test_unknown_message_type() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"data: X\r\n\r\n"));
        assert_eq!(err, MalformedFrame::UnknownMessageType(b'X'));
    }

    #[test]
    fn test_type_line_wrong_length() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"data: Text\r\n\r\n"));
        assert_eq!(err, MalformedFrame::InvalidTypeLine { length: 10 });
    }

    #[test]
    fn test_blank_line_instead_of_type_line() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"\r\n"));
        assert_eq!(err, MalformedFrame::InvalidTypeLine { length: 0 });
    }

    #[test]
    fn test_bare_line_feed_is_empty_line() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"\ndata: T\r\n"));
        assert_eq!(err, MalformedFrame::EmptyLine);
    }

    #[test]
    fn test_line_without_carriage_return() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"data: T\n\r\n"));
        assert_eq!(err, MalformedFrame::MissingLineTerminator);
    }

    #[test]
    fn test_trailing_data_rejected() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"data: T\r\n\r\nGARBAGE"));
        assert_eq!(err, MalformedFrame::TrailingData);
    }

    #[test]
    fn test_terminator_cr_without_lf() {
        let mut parser = MessageParser::new();

        let err = malformed(parse_bytes(&mut parser, b"data: T\r\n\rX\r\n"));
        assert_eq!(err, MalformedFrame::MissingLineTerminator);
    }

    #[test]
    fn test_missing_final_lf_is_incomplete() {
        let mut parser = MessageParser::new();
        let data = b"data: T\r\ndata: A\r\n\r";

        let parsed = parse_bytes(&mut parser, data).unwrap();

        assert_eq!(parsed.result, ParseResult::Incomplete);
        assert_eq!(parsed.consumed.offset(), data.len() - 1);
        assert_eq!(parsed.examined.offset(), data.len());
        assert_eq!(parser.state_name(), "ReadEndOfMessage");

        let message = completed(parse_bytes(&mut parser, b"\r\n").unwrap());
        assert_eq!(message.payload(), b"A");
    }

    #[test]
    fn test_partial_line_at_eof_is_error() {
        let mut parser = MessageParser::new();
        let buf = ReadBuffer::new(b"data: T\r\ndata: A").with_eof(true);

        let err = malformed(parser.parse(&buf));
        assert_eq!(err, MalformedFrame::MissingLineTerminator);
    }

    #[test]
    fn test_partial_type_line() {
        let mut parser = MessageParser::new();

        let parsed = parse_bytes(&mut parser, b"data: ").unwrap();

        assert_eq!(parsed.result, ParseResult::Incomplete);
        assert_eq!(parsed.consumed.offset(), 0);
        assert_eq!(parsed.examined.offset(), 6);
        assert_eq!(parser.state_name(), "ReadMessageType");
    }

    #[test]
    fn test_empty_buffer_is_incomplete() {
        let mut parser = MessageParser::new();

        let parsed = parse_bytes(&mut parser, b"").unwrap();

        assert_eq!(parsed.result, ParseResult::Incomplete);
        assert_eq!(parsed.consumed, parsed.examined);
    }

    #[test]
    fn test_type_survives_split_before_terminator() {
        let mut parser = MessageParser::new();

        let parsed = parse_bytes(&mut parser, b"data: C\r\n").unwrap();
        assert_eq!(parsed.result, ParseResult::Incomplete);
        assert_eq!(parsed.consumed.offset(), 9);
        assert_eq!(parser.state_name(), "ReadMessagePayload");

        let message = completed(parse_bytes(&mut parser, b"\r\n").unwrap());
        assert!(message.is_close());
        assert!(message.payload().is_empty());
    }

    #[test]
    fn test_every_split_point_resumes() {
        let frame = b"data: E\r\ndata: first \r\ndata: second\r\n\r\n";

        let mut reference = MessageParser::new();
        let expected = completed(parse_bytes(&mut reference, frame).unwrap());

        for split in 0..frame.len() {
            let mut parser = MessageParser::new();
            let parsed = parse_bytes(&mut parser, &frame[..split]).unwrap();
            assert_eq!(parsed.result, ParseResult::Incomplete, "split at {}", split);
            assert!(parsed.consumed.offset() <= split);

            let rest = &frame[parsed.consumed.offset()..];
            let message = completed(parse_bytes(&mut parser, rest).unwrap());
            assert_eq!(message, expected, "split at {}", split);
        }
    }

    #[test]
    fn test_incomplete_is_idempotent() {
        let mut parser = MessageParser::new();
        let data = b"data: T\r\ndata: one\r\ndata: tw";

        let first = parse_bytes(&mut parser, data).unwrap();
        assert_eq!(first.result, ParseResult::Incomplete);
        let pending = parser.pending_len();
        let rest = &data[first.consumed.offset()..];

        for _ in 0..3 {
            let again = parse_bytes(&mut parser, rest).unwrap();
            assert_eq!(again.result, ParseResult::Incomplete);
            assert_eq!(again.consumed.offset(), 0);
            assert_eq!(again.examined.offset(), rest.len());
            assert_eq!(parser.pending_len(), pending);
            assert_eq!(parser.state_name(), "ReadMessagePayload");
        }
    }

    #[test]
    fn test_completion_returns_to_type_state() {
        let mut parser = MessageParser::new();

        let first = completed(parse_bytes(&mut parser, b"data: T\r\ndata: a\r\n\r\n").unwrap());
        let second = completed(parse_bytes(&mut parser, b"data: B\r\ndata: b\r\n\r\n").unwrap());

        assert_eq!(first.payload(), b"a");
        assert!(second.is_binary());
        assert_eq!(second.payload(), b"b");
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut parser = MessageParser::new();

        parse_bytes(&mut parser, b"data: B\r\ndata: stale\r\n").unwrap();
        assert_eq!(parser.pending_len(), 5);
        assert!(!parser.is_idle());

        parser.reset();
        assert!(parser.is_idle());
        assert_eq!(parser.state_name(), "ReadMessageType");

        let message = completed(parse_bytes(&mut parser, b"data: T\r\ndata: fresh\r\n\r\n").unwrap());
        assert!(message.is_text());
        assert_eq!(message.payload(), b"fresh");
    }

    #[test]
    fn test_segmented_buffer() {
        let mut parser = MessageParser::new();
        let buf = ReadBuffer::from_segments([
            &b"data: T\r"[..],
            &b"\ndata: he"[..],
            &b"llo\r\n\r"[..],
            &b"\n"[..],
        ]);

        let message = completed(parser.parse(&buf).unwrap());
        assert_eq!(message.payload(), b"hello");
    }

    #[test]
    fn test_payload_limit() {
        let mut parser = MessageParser::with_max_payload(4);

        let result = parse_bytes(&mut parser, b"data: T\r\ndata: abc\r\ndata: de\r\n\r\n");

        match result {
            Err(SsewireError::PayloadTooLarge { size, max }) => {
                assert_eq!(size, 5);
                assert_eq!(max, 4);
            }
            other => panic!("expected payload limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_at_limit_accepted() {
        let mut parser = MessageParser::with_max_payload(4);

        let message = completed(parse_bytes(&mut parser, b"data: T\r\ndata: abcd\r\n\r\n").unwrap());
        assert_eq!(message.payload_len(), 4);
        assert_eq!(parser.max_payload_size(), 4);
    }
}
