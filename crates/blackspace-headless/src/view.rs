//! Monospace cell view.
//!
//! [`HeadlessView`] lays out a window of logical lines (no soft wrapping) on a fixed grid of
//! character cells. Character widths follow UAX #11 via `unicode-width`; tabs advance to the next
//! tab stop. Anything starting at or beyond the last column is clipped and has no geometry.

use crate::document::Document;
use blackspace_core::{CharSpan, Line, Overlay, OverlayLayer, Rect, TextView};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// Visual width of a character, 0 for zero-width and 1 for control characters.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Width in cells of `ch` when it starts at cell `x` of its row.
///
/// A tab spans up to the next multiple of `tab_width`.
pub fn cell_width_at(ch: char, x: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - x % tab_width
    } else {
        char_width(ch)
    }
}

/// Overlays drawn on a [`HeadlessView`], keyed by character offset.
#[derive(Debug, Clone, Default)]
pub struct OverlayCanvas {
    overlays: BTreeMap<usize, Overlay>,
}

impl OverlayCanvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns `true` if nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// The overlay drawn over the character at `offset`.
    pub fn get(&self, offset: usize) -> Option<&Overlay> {
        self.overlays.get(&offset)
    }

    /// Every overlay, by ascending offset.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.values()
    }

    /// Overlays whose character lies in `range`, by ascending offset.
    pub fn in_range(&self, range: Range<usize>) -> impl Iterator<Item = &Overlay> {
        self.overlays.range(range).map(|(_, overlay)| overlay)
    }
}

impl OverlayLayer for OverlayCanvas {
    fn add(&mut self, overlay: Overlay) {
        self.overlays.insert(overlay.span.offset, overlay);
    }

    fn remove_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let mut tail = self.overlays.split_off(&range.start);
        let mut kept = tail.split_off(&range.end);
        self.overlays.append(&mut kept);
    }

    fn remove_all(&mut self) {
        self.overlays.clear();
    }
}

/// Grid and font metrics of a [`HeadlessView`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    /// Visible rows.
    pub rows: usize,
    /// Visible columns (cells).
    pub columns: usize,
    /// Cell width in pixels.
    pub cell_width: f64,
    /// Cell height in pixels.
    pub cell_height: f64,
    /// Tab stop interval in cells.
    pub tab_width: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            rows: 50,
            columns: 120,
            cell_width: 8.0,
            cell_height: 16.0,
            tab_width: 4,
        }
    }
}

/// A scrollable viewport over a [`Document`].
#[derive(Debug)]
pub struct HeadlessView {
    document: Document,
    options: ViewOptions,
    top: usize,
    // `None` once the view is closed.
    lines: Option<Vec<Line>>,
    canvas: Option<OverlayCanvas>,
}

impl HeadlessView {
    /// Open a view at the top of `document`.
    pub fn new(document: Document, options: ViewOptions) -> Self {
        let mut view = Self {
            document,
            options,
            top: 0,
            lines: Some(Vec::new()),
            canvas: Some(OverlayCanvas::new()),
        };
        view.relayout(true);
        view
    }

    /// The displayed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current metrics.
    pub fn options(&self) -> ViewOptions {
        self.options
    }

    /// Index of the first visible line.
    pub fn top(&self) -> usize {
        self.top
    }

    /// Returns `true` after [`HeadlessView::close`].
    pub fn is_closed(&self) -> bool {
        self.lines.is_none()
    }

    /// The laid-out lines, top to bottom. Empty once closed.
    pub fn laid_out_lines(&self) -> &[Line] {
        self.lines.as_deref().unwrap_or(&[])
    }

    /// The overlay canvas, if the view is still open.
    pub fn canvas(&self) -> Option<&OverlayCanvas> {
        self.canvas.as_ref()
    }

    /// Scroll so that line `top` is the first visible one.
    ///
    /// Returns the lines that came into view or moved to another row.
    pub fn scroll_to(&mut self, top: usize) -> Vec<Line> {
        let top = top.min(self.document.line_count().saturating_sub(1));
        if top == self.top {
            return Vec::new();
        }
        self.top = top;
        self.relayout(false)
    }

    /// Change the grid size. Returns the lines that need redecorating.
    pub fn resize(&mut self, rows: usize, columns: usize) -> Vec<Line> {
        let columns_changed = columns != self.options.columns;
        self.options.rows = rows;
        self.options.columns = columns;
        self.relayout(columns_changed)
    }

    /// Show another document, scrolled to the top. Returns every laid-out line.
    pub fn replace_document(&mut self, document: Document) -> Vec<Line> {
        self.document = document;
        self.top = 0;
        self.relayout(true)
    }

    /// Re-lay out after the document changed. Returns the lines whose text or position changed.
    pub fn refresh(&mut self) -> Vec<Line> {
        self.relayout(false)
    }

    /// Tear the view down. Lines and canvas are released; later redraws draw nothing.
    pub fn close(&mut self) {
        self.lines = None;
        self.canvas = None;
        tracing::debug!("headless view closed");
    }

    fn relayout(&mut self, everything: bool) -> Vec<Line> {
        let Some(old) = self.lines.take() else {
            return Vec::new();
        };
        let new = self
            .document
            .lines_in(self.top..self.top.saturating_add(self.options.rows));

        let kept: HashSet<&Line> = new.iter().collect();
        if let Some(canvas) = self.canvas.as_mut() {
            for line in old.iter().filter(|line| !kept.contains(line)) {
                canvas.remove_range(line.range());
            }
        }

        // Geometry is viewport-relative, so a kept line on a new row is stale too.
        let previous: HashMap<&Line, usize> =
            old.iter().enumerate().map(|(row, line)| (line, row)).collect();
        let changed: Vec<Line> = new
            .iter()
            .enumerate()
            .filter(|&(row, line)| everything || previous.get(line) != Some(&row))
            .map(|(_, line)| line.clone())
            .collect();
        tracing::trace!(
            top = self.top,
            rows = new.len(),
            changed = changed.len(),
            "laid out view"
        );
        self.lines = Some(new);
        changed
    }
}

impl TextView for HeadlessView {
    type Layer = OverlayCanvas;

    fn visible_lines(&self) -> Option<Vec<Line>> {
        self.lines.clone()
    }

    fn marker_geometry(&self, span: CharSpan) -> Option<Rect> {
        let lines = self.lines.as_ref()?;
        let row = lines.partition_point(|line| line.end() <= span.offset);
        let line = lines.get(row).filter(|line| line.contains(span.offset))?;

        let column = span.offset - line.start();
        let tab_width = self.options.tab_width;
        let mut x = 0;
        let mut chars = line.text().chars();
        for ch in chars.by_ref().take(column) {
            x += cell_width_at(ch, x, tab_width);
        }
        let ch = chars.next()?;
        if x >= self.options.columns {
            return None;
        }

        let width = cell_width_at(ch, x, tab_width);
        Some(Rect::new(
            x as f64 * self.options.cell_width,
            row as f64 * self.options.cell_height,
            width as f64 * self.options.cell_width,
            self.options.cell_height,
        ))
    }

    fn overlay_layer(&mut self) -> Option<&mut OverlayCanvas> {
        self.canvas.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackspace_core::{Color, WhitespaceKind};

    fn overlay(offset: usize) -> Overlay {
        Overlay {
            span: CharSpan::new(offset),
            kind: WhitespaceKind::Space,
            bounds: Rect::default(),
            fill: Color::TRANSPARENT,
            stroke: Color::TRANSPARENT,
            stroke_thickness: 0.0,
        }
    }

    #[test]
    fn test_cell_width_at() {
        assert_eq!(cell_width_at('a', 0, 4), 1);
        assert_eq!(cell_width_at('中', 0, 4), 2);
        assert_eq!(cell_width_at('\t', 0, 4), 4);
        assert_eq!(cell_width_at('\t', 1, 4), 3);
        assert_eq!(cell_width_at('\t', 4, 4), 4);
        assert_eq!(cell_width_at('\t', 3, 0), 1);
    }

    #[test]
    fn test_canvas_remove_range() {
        let mut canvas = OverlayCanvas::new();
        for offset in [1, 3, 5, 7] {
            canvas.add(overlay(offset));
        }
        canvas.remove_range(3..6);
        let offsets: Vec<_> = canvas.iter().map(|o| o.span.offset).collect();
        assert_eq!(offsets, vec![1, 7]);

        canvas.remove_range(4..4);
        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.in_range(0..2).count(), 1);
    }

    #[test]
    fn test_geometry_expands_tabs_and_wide_chars() {
        let view = HeadlessView::new(Document::new("中\t \nab"), ViewOptions::default());
        // '中' takes cells 0..2, the tab 2..4, the space cell 4.
        assert_eq!(
            view.marker_geometry(CharSpan::new(1)),
            Some(Rect::new(16.0, 0.0, 16.0, 16.0))
        );
        assert_eq!(
            view.marker_geometry(CharSpan::new(2)),
            Some(Rect::new(32.0, 0.0, 8.0, 16.0))
        );
        // Line terminator and past-the-end offsets have no geometry.
        assert_eq!(view.marker_geometry(CharSpan::new(3)), None);
        assert_eq!(
            view.marker_geometry(CharSpan::new(5)),
            Some(Rect::new(8.0, 16.0, 8.0, 16.0))
        );
        assert_eq!(view.marker_geometry(CharSpan::new(6)), None);
    }

    #[test]
    fn test_geometry_clips_columns() {
        let options = ViewOptions {
            columns: 3,
            ..ViewOptions::default()
        };
        let view = HeadlessView::new(Document::new("ab  "), options);
        assert!(view.marker_geometry(CharSpan::new(2)).is_some());
        assert_eq!(view.marker_geometry(CharSpan::new(3)), None);
    }
}
