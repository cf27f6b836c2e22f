//! Read-only view over the bytes a caller has available for parsing.
//!
//! The caller owns the bytes; a [`ReadBuffer`] only borrows them, possibly as
//! several discontiguous segments (e.g. the two halves of a ring buffer).
//! Positions inside the view are expressed as [`Position`] cursors.
//!
//! Slicing between two cursors borrows when the span lies inside one segment
//! and copies only when it crosses a segment boundary.
//!
//! # Example
//!
//! ```
//! use ssewire::protocol::ReadBuffer;
//!
//! let buf = ReadBuffer::from_segments([&b"data: T\r"[..], &b"\n\r\n"[..]]);
//!
//! let lf = buf.seek(buf.start(), b'\n').unwrap();
//! assert_eq!(lf.offset(), 8);
//! assert_eq!(&buf.slice(buf.start(), lf)[..], b"data: T\r");
//! ```

use std::borrow::Cow;

/// Opaque cursor into a [`ReadBuffer`].
///
/// Cursors are ordered; `offset()` is the distance from the start of the
/// buffer, which is how many bytes a caller may discard up to this point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(usize);

impl Position {
    /// Bytes between the buffer start and this cursor.
    #[inline]
    pub fn offset(self) -> usize {
        self.0
    }

    /// Cursor `n` bytes further on.
    #[inline]
    pub fn advance(self, n: usize) -> Self {
        Self(self.0 + n)
    }

    /// Bytes from this cursor forward to `other` (0 if `other` is behind).
    #[inline]
    pub fn distance_to(self, other: Position) -> usize {
        other.0.saturating_sub(self.0)
    }
}

/// Segmented, read-only byte view handed to the parser.
#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    segments: Vec<&'a [u8]>,
    len: usize,
    eof: bool,
}

impl<'a> ReadBuffer<'a> {
    /// View over a single contiguous slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::from_segments([data])
    }

    /// View over several segments, in stream order. Empty segments are dropped.
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let segments: Vec<&'a [u8]> = segments.into_iter().filter(|s| !s.is_empty()).collect();
        let len = segments.iter().map(|s| s.len()).sum();
        Self {
            segments,
            len,
            eof: false,
        }
    }

    /// Mark whether more bytes can follow this view.
    ///
    /// With `eof` set, a partial line is malformed instead of incomplete.
    pub fn with_eof(mut self, eof: bool) -> Self {
        self.eof = eof;
        self
    }

    /// True if the transport has signalled that no more data will arrive.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    #[inline]
    pub fn start(&self) -> Position {
        Position(0)
    }

    #[inline]
    pub fn end(&self) -> Position {
        Position(self.len)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty segments backing the view.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Segment index and offset within it for `pos`, if `pos` is inside the view.
    fn locate(&self, pos: Position) -> Option<(usize, usize)> {
        let mut base = 0;
        for (idx, segment) in self.segments.iter().enumerate() {
            if pos.0 < base + segment.len() {
                return Some((idx, pos.0 - base));
            }
            base += segment.len();
        }
        None
    }

    /// Peek the byte at `pos`.
    pub fn byte_at(&self, pos: Position) -> Option<u8> {
        let (idx, offset) = self.locate(pos)?;
        Some(self.segments[idx][offset])
    }

    /// Find the next `byte` at or after `from`.
    pub fn seek(&self, from: Position, byte: u8) -> Option<Position> {
        let (first, mut offset) = self.locate(from)?;
        let mut base = from.0 - offset;

        for segment in &self.segments[first..] {
            if let Some(idx) = memchr::memchr(byte, &segment[offset..]) {
                return Some(Position(base + offset + idx));
            }
            base += segment.len();
            offset = 0;
        }
        None
    }

    /// Bytes in `[from, to)`.
    ///
    /// Borrowed when the span sits in one segment, copied otherwise. Spans
    /// reaching past the end are truncated to it.
    pub fn slice(&self, from: Position, to: Position) -> Cow<'a, [u8]> {
        let len = from.distance_to(to.min(self.end()));
        if len == 0 {
            return Cow::Borrowed(&[]);
        }
        let Some((first, offset)) = self.locate(from) else {
            return Cow::Borrowed(&[]);
        };

        let segment = self.segments[first];
        if offset + len <= segment.len() {
            return Cow::Borrowed(&segment[offset..offset + len]);
        }

        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&segment[offset..]);
        for segment in &self.segments[first + 1..] {
            let needed = len - out.len();
            if needed == 0 {
                break;
            }
            out.extend_from_slice(&segment[..needed.min(segment.len())]);
        }
        Cow::Owned(out)
    }
}

impl<'a> From<&'a [u8]> for ReadBuffer<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}
