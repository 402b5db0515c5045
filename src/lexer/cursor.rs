//! # Cursor
//!
//! Byte-by-byte navigation through C source with position tracking.
//!
//! The accepted subset is ASCII, so the cursor operates on a byte slice
//! (`&[u8]`) rather than `Vec<char>`. `pos` serves as both the byte offset
//! and the character index — they are identical for ASCII input. Non-ASCII
//! bytes are not silently consumed; the lexer reports them as errors.

use crate::error::Span;

/// A cursor for iterating through source code bytes
///
/// Tracks position in multiple ways:
/// - Byte position (doubles as the span offset)
/// - Line and column numbers (for error messages)
pub struct Cursor<'a> {
    /// Source bytes
    bytes: &'a [u8],
    /// Current byte position
    pos: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    col: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// One byte of extra lookahead, needed for two-char operators and `0x`.
    pub fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Advance to the next byte and return it.
    ///
    /// Updates line/column tracking:
    /// - '\n' increments line, resets column to 1
    /// - Other bytes increment column
    pub fn advance(&mut self) -> Option<u8> {
        if let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            Some(b)
        } else {
            None
        }
    }

    /// Consume the next byte if it equals `expected`.
    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Returns `(byte, line, col)` of the current cursor position.
    pub fn current_pos(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.col)
    }

    /// Build a `Span` from the given start position to the current position.
    pub fn make_span(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span {
            start,
            end: self.pos,
            line: start_line,
            col: start_col,
        }
    }

    /// Raw source text between two byte offsets (ASCII input).
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.bytes[start..end].iter().map(|&b| b as char).collect()
    }
}
