//! Bounds-checked cursor over a window of the input.
//!
//! The block parser works on nested windows of one buffer: the whole document
//! at the top level, then the inner content of each element. A `Cursor` never
//! reads past the end of its window, and every operation that needs a
//! following character returns `UnexpectedEnd` instead of running off the end.
//!
//! Searches use `memchr` (SIMD on supported platforms).

use memchr::memchr;
use memchr::memmem;

use crate::error::ParseError;
use crate::scan::is_space;
use crate::span::Span;

/// Fallible cursor over `input[start..end]`.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// The complete input text.
    input: &'a str,
    /// Input as bytes for scanning.
    bytes: &'a [u8],
    /// Current byte offset (absolute).
    pos: usize,
    /// End of the window (absolute, exclusive).
    end: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor over the whole input.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            end: input.len(),
        }
    }

    /// Create a cursor restricted to `window`.
    ///
    /// The window is clamped to the input length.
    #[inline]
    pub fn with_window(input: &'a str, window: Span) -> Self {
        let end = window.end.min(input.len());
        Self {
            input,
            bytes: input.as_bytes(),
            pos: window.start.min(end),
            end,
        }
    }

    /// Get the current byte offset.
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// End of the window.
    #[inline(always)]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Check if the window has been consumed.
    #[inline(always)]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.end
    }

    /// Move to an absolute offset, clamped to the window end.
    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
    }

    /// Peek at the current byte.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Peek `ahead` bytes past the current one.
    #[inline(always)]
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        let at = self.pos.checked_add(ahead)?;
        if at < self.end {
            Some(self.bytes[at])
        } else {
            None
        }
    }

    /// Check whether the window continues with `literal`.
    #[inline]
    pub fn starts_with(&self, literal: &[u8]) -> bool {
        self.remaining().starts_with(literal)
    }

    /// Consume and return the current byte, failing at the end of the window.
    ///
    /// `expected` names what the caller was looking for, for the error message.
    #[inline]
    pub fn bump(&mut self, expected: &str) -> Result<u8, ParseError> {
        match self.peek() {
            Some(b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(ParseError::unexpected_end(expected, self.pos)),
        }
    }

    /// Consume `byte` if it is next.
    #[inline]
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `byte`, or fail.
    ///
    /// Fails with `UnexpectedEnd` at the end of the window and with
    /// `InvalidSyntax` when a different byte is present.
    #[inline]
    pub fn expect(&mut self, byte: u8, expected: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(ParseError::invalid_syntax(
                &format!("expected {}", expected),
                Span::new(self.pos, self.pos + 1),
            )),
            None => Err(ParseError::unexpected_end(expected, self.pos)),
        }
    }

    /// Skip ASCII whitespace and return the count skipped.
    #[inline]
    pub fn skip_whitespace(&mut self) -> usize {
        self.take_while(is_space).len()
    }

    /// Consume bytes while `pred` holds and return the consumed span.
    #[inline]
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> Span {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        Span::new(start, self.pos)
    }

    /// Find the next `byte` at or after the current position.
    ///
    /// Returns the absolute offset without moving the cursor.
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.remaining()).map(|i| self.pos + i)
    }

    /// Find the next occurrence of `needle` at or after the current position.
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Move past the next `byte`, returning its offset.
    #[inline]
    pub fn skip_past_byte(&mut self, byte: u8, expected: &str) -> Result<usize, ParseError> {
        match self.find_byte(byte) {
            Some(at) => {
                self.pos = at + 1;
                Ok(at)
            }
            None => Err(ParseError::unexpected_end(expected, self.end)),
        }
    }

    /// Move past the next `needle`, returning the offset where it starts.
    #[inline]
    pub fn skip_past_seq(&mut self, needle: &[u8], expected: &str) -> Result<usize, ParseError> {
        match self.find_seq(needle) {
            Some(at) => {
                self.pos = at + needle.len();
                Ok(at)
            }
            None => Err(ParseError::unexpected_end(expected, self.end)),
        }
    }

    /// Get the unconsumed part of the window.
    #[inline(always)]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..self.end]
    }

    /// Raw bytes of a span.
    #[inline(always)]
    pub fn bytes(&self, span: Span) -> &'a [u8] {
        &self.bytes[span.start..span.end]
    }

    /// Get a slice of the input by span.
    ///
    /// Every span the parser cuts starts and ends next to an ASCII delimiter,
    /// so it always lies on char boundaries.
    #[inline(always)]
    pub fn slice(&self, span: Span) -> &'a str {
        &self.input[span.start..span.end]
    }

    /// The complete input text.
    #[inline(always)]
    pub fn input(&self) -> &'a str {
        self.input
    }
}
