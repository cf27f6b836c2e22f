//! # ssewire
//!
//! Incremental decoder for the `data:` line framing used to carry
//! Text/Binary/Close/Error messages over a Server-Sent-Events style stream.
//!
//! ## Wire format
//!
//! ```text
//! data: T\r\n
//! data: first chunk\r\n
//! data: second chunk\r\n
//! \r\n
//! ```
//!
//! The parser never blocks and never needs a whole frame up front. Feed it
//! whatever bytes the transport produced; it reports how much was consumed
//! and keeps the state of a partial frame until the next call.
//!
//! ## Example
//!
//! ```
//! use ssewire::protocol::{MessageParser, ParseResult, ReadBuffer};
//!
//! let mut parser = MessageParser::new();
//! let parsed = parser.parse(&ReadBuffer::new(b"data: B\r\ndata: \x01\x02\r\n\r\n"))?;
//!
//! if let ParseResult::Completed(message) = parsed.result {
//!     assert!(message.is_binary());
//!     assert_eq!(message.payload(), b"\x01\x02");
//! }
//! # Ok::<(), ssewire::SsewireError>(())
//! ```

pub mod error;
pub mod protocol;

pub use error::{MalformedFrame, SsewireError};
pub use protocol::{Message, MessageBuffer, MessageParser, MessageType, ParseResult};
