#![allow(dead_code)]

use blackspace_core::{
    CharSpan, CommandStatus, CommandTarget, EditError, HostCommand, Line, Overlay, OverlayLayer,
    Rect, TextBuffer, TextEdit,
};
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

/// Builds lines the way a host would: one `\n` between consecutive lines.
pub fn lines_of(texts: &[&str]) -> Vec<Line> {
    let mut start = 0;
    texts
        .iter()
        .map(|text| {
            let line = Line::new(start, *text);
            start = line.end() + 1;
            line
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct MockLayer {
    pub overlays: BTreeMap<usize, Overlay>,
    pub remove_all_calls: usize,
}

impl MockLayer {
    pub fn offsets(&self) -> Vec<usize> {
        self.overlays.keys().copied().collect()
    }
}

impl OverlayLayer for MockLayer {
    fn add(&mut self, overlay: Overlay) {
        self.overlays.insert(overlay.span.offset, overlay);
    }

    fn remove_range(&mut self, range: Range<usize>) {
        self.overlays.retain(|offset, _| !range.contains(offset));
    }

    fn remove_all(&mut self) {
        self.remove_all_calls += 1;
        self.overlays.clear();
    }
}

/// A fixed-pitch view where every line is visible and each char is one cell.
#[derive(Debug)]
pub struct MockView {
    pub lines: Option<Vec<Line>>,
    pub layer: Option<MockLayer>,
    pub hidden: HashSet<usize>,
}

impl MockView {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            lines: Some(lines_of(texts)),
            layer: Some(MockLayer::default()),
            hidden: HashSet::new(),
        }
    }

    pub fn layer(&self) -> &MockLayer {
        self.layer.as_ref().expect("layer present")
    }

    pub fn set_lines(&mut self, texts: &[&str]) -> Vec<Line> {
        let lines = lines_of(texts);
        self.lines = Some(lines.clone());
        lines
    }
}

impl blackspace_core::TextView for MockView {
    type Layer = MockLayer;

    fn visible_lines(&self) -> Option<Vec<Line>> {
        self.lines.clone()
    }

    fn marker_geometry(&self, span: CharSpan) -> Option<Rect> {
        if self.hidden.contains(&span.offset) {
            return None;
        }
        let lines = self.lines.as_ref()?;
        let row = lines.iter().position(|line| line.contains(span.offset))?;
        let column = span.offset - lines[row].start();
        Some(Rect::new(
            column as f64 * CELL_WIDTH,
            row as f64 * CELL_HEIGHT,
            CELL_WIDTH,
            CELL_HEIGHT,
        ))
    }

    fn overlay_layer(&mut self) -> Option<&mut MockLayer> {
        self.layer.as_mut()
    }
}

/// A line-vector buffer that counts applied transactions.
#[derive(Debug, Default)]
pub struct MockBuffer {
    pub lines: Vec<String>,
    pub applied_edits: usize,
    pub deletions: usize,
    /// Make every `apply` fail as if the buffer changed underneath the edit.
    pub conflict_on_apply: bool,
}

impl MockBuffer {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            ..Self::default()
        }
    }
}

pub struct MockEdit<'a> {
    buffer: &'a mut MockBuffer,
    pending: Vec<(usize, usize)>,
}

impl TextEdit for MockEdit<'_> {
    fn lines(&self) -> Vec<Line> {
        let texts: Vec<&str> = self.buffer.lines.iter().map(String::as_str).collect();
        lines_of(&texts)
    }

    fn delete(&mut self, offset: usize, len: usize) -> Result<(), EditError> {
        self.pending.push((offset, len));
        Ok(())
    }

    fn apply(mut self) -> Result<(), EditError> {
        if self.buffer.conflict_on_apply {
            return Err(EditError::Conflict);
        }
        let mut chars: Vec<char> = self.buffer.lines.join("\n").chars().collect();
        self.pending.sort_by(|a, b| b.0.cmp(&a.0));
        for (offset, len) in &self.pending {
            chars.drain(*offset..*offset + *len);
        }
        let text: String = chars.into_iter().collect();
        self.buffer.lines = text.split('\n').map(str::to_string).collect();
        self.buffer.applied_edits += 1;
        self.buffer.deletions += self.pending.len();
        Ok(())
    }
}

impl TextBuffer for MockBuffer {
    type Edit<'a>
        = MockEdit<'a>
    where
        Self: 'a;

    fn create_edit(&mut self) -> MockEdit<'_> {
        MockEdit {
            buffer: self,
            pending: Vec::new(),
        }
    }
}

/// The host's own save handler, recording what reached it.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub executed: Vec<HostCommand>,
    pub queried: Vec<HostCommand>,
}

impl CommandTarget for RecordingTarget {
    type Error = String;

    fn query_status(&mut self, command: HostCommand) -> CommandStatus {
        self.queried.push(command);
        CommandStatus::default()
    }

    fn exec(&mut self, command: HostCommand) -> Result<(), String> {
        self.executed.push(command);
        Ok(())
    }
}
