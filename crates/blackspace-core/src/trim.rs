//! Trim-on-save.
//!
//! [`SaveTrimmer`] removes trailing whitespace from every line of a buffer in one atomic edit
//! when the live configuration asks for it.
//!
//! Note that the whitespace test used here is [`char::is_whitespace`], which is broader than the
//! space/tab-only test the overlays use ([`WhitespaceKind::classify`]). A line ending in a
//! no-break space is therefore trimmed on save although it is never highlighted. The two
//! predicates are kept separate on purpose until that difference is settled.
//!
//! [`WhitespaceKind::classify`]: crate::WhitespaceKind::classify

use crate::registry::ConfigRegistry;
use crate::scanner::Line;
use std::rc::Rc;
use thiserror::Error;

/// Errors reported by a host edit transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("deletion {offset}+{len} is outside the snapshot (length {snapshot_len})")]
    /// A deletion does not fit in the snapshot the edit was opened against.
    OutOfRange {
        /// Deletion start offset.
        offset: usize,
        /// Deletion length.
        len: usize,
        /// Snapshot length in characters.
        snapshot_len: usize,
    },

    #[error("deletion at {offset} overlaps an earlier deletion in the same edit")]
    /// Two deletions of one edit overlap.
    Overlapping {
        /// Start offset of the rejected deletion.
        offset: usize,
    },

    #[error("the buffer changed after the edit was created")]
    /// The buffer was modified by someone else before `apply`.
    Conflict,
}

/// An open edit transaction against a fixed snapshot of a buffer.
///
/// Deletions are expressed in character offsets of that snapshot and take effect together on
/// [`TextEdit::apply`]. Dropping an edit without applying it discards it.
pub trait TextEdit {
    /// The lines of the snapshot this edit was opened against.
    fn lines(&self) -> Vec<Line>;

    /// Schedule deletion of `len` characters at `offset`.
    fn delete(&mut self, offset: usize, len: usize) -> Result<(), EditError>;

    /// Apply every scheduled deletion atomically.
    fn apply(self) -> Result<(), EditError>;
}

/// A host text buffer that can be edited transactionally.
pub trait TextBuffer {
    /// The transaction type.
    type Edit<'a>: TextEdit
    where
        Self: 'a;

    /// Begin an edit against the current snapshot.
    fn create_edit(&mut self) -> Self::Edit<'_>;
}

/// Outcome of a trim pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrimReport {
    /// Number of lines that had trailing whitespace removed.
    pub lines_trimmed: usize,
    /// Number of characters removed.
    pub chars_removed: usize,
}

impl TrimReport {
    /// Returns `true` if nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.chars_removed == 0
    }
}

/// Character index (within `text`) where the trailing whitespace run starts, or `None` if the
/// text does not end in whitespace.
///
/// Uses the general Unicode predicate [`char::is_whitespace`].
pub fn trailing_trim_start(text: &str) -> Option<usize> {
    let trailing = text.chars().rev().take_while(|ch| ch.is_whitespace()).count();
    if trailing == 0 {
        return None;
    }
    Some(text.chars().count() - trailing)
}

/// Strips trailing whitespace from a buffer when a save is intercepted.
#[derive(Clone)]
pub struct SaveTrimmer {
    registry: Rc<ConfigRegistry>,
}

impl SaveTrimmer {
    /// Create a trimmer that reads the trim flag from `registry` at save time.
    pub fn new(registry: &Rc<ConfigRegistry>) -> Self {
        Self {
            registry: Rc::clone(registry),
        }
    }

    /// Handle an intercepted save of `buffer`.
    ///
    /// Returns `Ok(None)` without touching the buffer when trimming is disabled.
    pub fn on_save<B: TextBuffer>(&self, buffer: &mut B) -> Result<Option<TrimReport>, EditError> {
        if !self.registry.config().trim_on_save {
            return Ok(None);
        }
        Self::trim(buffer).map(Some)
    }

    /// Remove trailing whitespace from every line of `buffer`, regardless of configuration.
    ///
    /// All deletions go into a single edit. If nothing needs deleting the edit is discarded
    /// without being applied.
    pub fn trim<B: TextBuffer>(buffer: &mut B) -> Result<TrimReport, EditError> {
        let mut edit = buffer.create_edit();
        let mut report = TrimReport::default();

        for line in edit.lines() {
            if line.is_empty() {
                continue;
            }
            let Some(keep) = trailing_trim_start(line.text()) else {
                continue;
            };

            let len = line.len() - keep;
            edit.delete(line.start() + keep, len)?;
            report.lines_trimmed += 1;
            report.chars_removed += len;
        }

        if !report.is_empty() {
            edit.apply()?;
        }
        tracing::debug!(
            lines = report.lines_trimmed,
            chars = report.chars_removed,
            "trimmed trailing whitespace"
        );
        Ok(report)
    }
}
