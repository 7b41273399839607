//! Rope-backed document.
//!
//! [`Document`] is a cheap, clonable handle: every clone sees the same text, the way several
//! views of one buffer do in a real editor. The text lives in a [`ropey::Rope`], which gives
//! O(log N) line lookup and char/line conversion.

use blackspace_core::{EditError, Line, TextBuffer, TextEdit};
use ropey::{Rope, RopeSlice};
use std::cell::RefCell;
use std::io;
use std::ops::Range;
use std::rc::Rc;

struct DocumentState {
    rope: Rope,
    version: u64,
}

/// Shared handle to a text document.
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

impl Document {
    /// Create a document from text.
    pub fn new(text: &str) -> Self {
        Self::from_rope(Rope::from_str(text))
    }

    /// Read a document from a UTF-8 stream.
    pub fn from_reader<R: io::Read>(reader: R) -> io::Result<Self> {
        Ok(Self::from_rope(Rope::from_reader(reader)?))
    }

    fn from_rope(rope: Rope) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState { rope, version: 0 })),
        }
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.state.borrow().rope.to_string()
    }

    /// Write the text to `writer`.
    pub fn write_to<W: io::Write>(&self, writer: W) -> io::Result<()> {
        self.state.borrow().rope.write_to(writer)
    }

    /// Incremented by every applied change.
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.state.borrow().rope.len_chars()
    }

    /// Number of lines. A trailing line break starts one more (empty) line.
    pub fn line_count(&self) -> usize {
        self.state.borrow().rope.len_lines()
    }

    /// Line `index`, without its terminator.
    pub fn line(&self, index: usize) -> Option<Line> {
        let state = self.state.borrow();
        (index < state.rope.len_lines()).then(|| line_at(&state.rope, index))
    }

    /// Lines `range` (clamped to the document), without terminators.
    pub fn lines_in(&self, range: Range<usize>) -> Vec<Line> {
        let state = self.state.borrow();
        let end = range.end.min(state.rope.len_lines());
        (range.start.min(end)..end)
            .map(|index| line_at(&state.rope, index))
            .collect()
    }

    /// Every line, without terminators.
    pub fn lines(&self) -> Vec<Line> {
        lines_of(&self.state.borrow().rope)
    }

    /// Insert `text` at character `offset`.
    pub fn insert(&self, offset: usize, text: &str) -> Result<(), EditError> {
        let mut state = self.state.borrow_mut();
        let snapshot_len = state.rope.len_chars();
        if offset > snapshot_len {
            return Err(EditError::OutOfRange {
                offset,
                len: 0,
                snapshot_len,
            });
        }
        state.rope.insert(offset, text);
        state.version += 1;
        Ok(())
    }

    /// Returns `true` if both handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Document")
            .field("chars", &state.rope.len_chars())
            .field("lines", &state.rope.len_lines())
            .field("version", &state.version)
            .finish()
    }
}

/// Number of characters of `line` before its line break.
fn content_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => len - 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => len - 1,
        _ => len,
    }
}

fn line_at(rope: &Rope, index: usize) -> Line {
    let slice = rope.line(index);
    let text = slice.slice(..content_len(slice)).to_string();
    Line::new(rope.line_to_char(index), text)
}

fn lines_of(rope: &Rope) -> Vec<Line> {
    (0..rope.len_lines()).map(|index| line_at(rope, index)).collect()
}

/// A pending set of deletions against one snapshot of a [`Document`].
pub struct RopeEdit<'a> {
    document: &'a Document,
    snapshot: Rope,
    version: u64,
    // Sorted by start, non-overlapping.
    deletions: Vec<Range<usize>>,
}

impl RopeEdit<'_> {
    /// Number of scheduled deletions.
    pub fn pending(&self) -> usize {
        self.deletions.len()
    }
}

impl TextEdit for RopeEdit<'_> {
    fn lines(&self) -> Vec<Line> {
        lines_of(&self.snapshot)
    }

    fn delete(&mut self, offset: usize, len: usize) -> Result<(), EditError> {
        let snapshot_len = self.snapshot.len_chars();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= snapshot_len)
            .ok_or(EditError::OutOfRange {
                offset,
                len,
                snapshot_len,
            })?;
        if len == 0 {
            return Ok(());
        }

        let index = self.deletions.partition_point(|range| range.start < offset);
        let overlaps_prev = index > 0 && self.deletions[index - 1].end > offset;
        let overlaps_next = self
            .deletions
            .get(index)
            .is_some_and(|range| range.start < end);
        if overlaps_prev || overlaps_next {
            return Err(EditError::Overlapping { offset });
        }

        self.deletions.insert(index, offset..end);
        Ok(())
    }

    fn apply(self) -> Result<(), EditError> {
        let mut state = self.document.state.borrow_mut();
        if state.version != self.version {
            return Err(EditError::Conflict);
        }
        if self.deletions.is_empty() {
            return Ok(());
        }

        for range in self.deletions.iter().rev() {
            state.rope.remove(range.clone());
        }
        state.version += 1;
        tracing::debug!(
            deletions = self.deletions.len(),
            version = state.version,
            "applied document edit"
        );
        Ok(())
    }
}

impl TextBuffer for Document {
    type Edit<'a>
        = RopeEdit<'a>
    where
        Self: 'a;

    fn create_edit(&mut self) -> RopeEdit<'_> {
        let (snapshot, version) = {
            let state = self.state.borrow();
            (state.rope.clone(), state.version)
        };
        RopeEdit {
            document: self,
            snapshot,
            version,
            deletions: Vec::new(),
        }
    }
}
