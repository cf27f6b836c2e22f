//! Decoded application message.
//!
//! Uses `bytes::Bytes` so the payload can be shared without copying.
//!
//! # Example
//!
//! ```
//! use ssewire::protocol::{Message, MessageType};
//! use bytes::Bytes;
//!
//! let message = Message::new(MessageType::Text, Bytes::from_static(b"hello"));
//!
//! assert!(message.is_text());
//! assert_eq!(message.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::MessageType;

/// One complete message, produced once per decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Type from the frame's first line.
    pub message_type: MessageType,
    /// Concatenated payload chunks (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Message {
    /// Create a new message from type and payload.
    pub fn new(message_type: MessageType, payload: Bytes) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Create a message from type and raw bytes (copies data).
    pub fn from_parts(message_type: MessageType, payload: &[u8]) -> Self {
        Self {
            message_type,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get the message type.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Consume the message, keeping only the payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.message_type == MessageType::Text
    }

    #[inline]
    pub fn is_binary(&self) -> bool {
        self.message_type == MessageType::Binary
    }

    #[inline]
    pub fn is_close(&self) -> bool {
        self.message_type == MessageType::Close
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }
}
