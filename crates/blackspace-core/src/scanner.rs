//! Trailing whitespace scanner.
//!
//! The scanner walks a single [`Line`] from its last character backward and reports every space
//! or tab until the first character that is neither. Only runs that touch the end of the line are
//! reported; whitespace embedded inside the line is never visited.
//!
//! All offsets are **character offsets** (Unicode scalar values) into a document snapshot.

use std::iter::{FusedIterator, Rev};
use std::ops::Range;
use std::str::Chars;

/// A single logical line taken from a document snapshot.
///
/// The text never includes the line terminator. A `Line` is immutable; the host produces a new
/// one whenever the document changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    start: usize,
    len: usize,
    text: String,
}

impl Line {
    /// Create a line starting at character offset `start`.
    pub fn new(start: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self { start, len, text }
    }

    /// Character offset of the first character of the line.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset (the position of the line terminator, if any).
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Length of the line in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the line has no characters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The line text (without line terminator).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Half-open character range covered by this line.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Returns `true` if `offset` addresses a character of this line.
    pub fn contains(&self, offset: usize) -> bool {
        self.range().contains(&offset)
    }
}

/// Position of exactly one character in a document snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharSpan {
    /// Character offset from the start of the document.
    pub offset: usize,
}

impl CharSpan {
    /// Every span covers a single character.
    pub const LEN: usize = 1;

    /// Create a span for the character at `offset`.
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + Self::LEN
    }

    /// Half-open character range of this span.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// The whitespace characters that get decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhitespaceKind {
    /// `' '` (U+0020)
    Space,
    /// `'\t'` (U+0009)
    Tab,
}

impl WhitespaceKind {
    /// Classify a character. Only the exact space and tab characters qualify; other Unicode
    /// whitespace (NBSP, ideographic space, ...) is not a rendering target.
    pub fn classify(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Self::Space),
            '\t' => Some(Self::Tab),
            _ => None,
        }
    }
}

/// Lazy iterator over the trailing whitespace of a line, last character first.
///
/// Created by [`scan_trailing_whitespace`].
#[derive(Debug, Clone)]
pub struct TrailingWhitespace<'a> {
    chars: Rev<Chars<'a>>,
    next_end: usize,
    done: bool,
}

impl Iterator for TrailingWhitespace<'_> {
    type Item = (CharSpan, WhitespaceKind);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.chars.next().and_then(WhitespaceKind::classify) {
            Some(kind) => {
                self.next_end -= 1;
                Some((CharSpan::new(self.next_end), kind))
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, self.chars.size_hint().1)
        }
    }
}

impl FusedIterator for TrailingWhitespace<'_> {}

/// Scan the trailing spaces and tabs of `line`.
///
/// Results are yielded from the end of the line toward its start and stop at the first
/// character that is not a space or tab. An empty line yields nothing.
pub fn scan_trailing_whitespace(line: &Line) -> TrailingWhitespace<'_> {
    TrailingWhitespace {
        chars: line.text().chars().rev(),
        next_end: line.end(),
        done: line.is_empty(),
    }
}
