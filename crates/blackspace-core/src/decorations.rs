//! Per-view trailing whitespace overlays.
//!
//! A [`DecorationManager`] is created for every open view. It scans the lines the host lays out,
//! asks the host for the on-screen geometry of every trailing space or tab, and places one
//! [`Overlay`] per character on the view's [`OverlayLayer`].
//!
//! Two redraw paths exist:
//!
//! - [`DecorationManager::on_lines_changed`]: incremental, for lines that were newly laid out or
//!   reformatted (scrolling, resizing, editing). Only the given lines are touched.
//! - [`DecorationManager::full_redraw`]: drop every overlay and redecorate all visible lines.
//!   Runs on construction and whenever the registry pushes a new [`StyleConfig`].

use crate::registry::{ConfigObserver, ConfigRegistry, ObserverId};
use crate::scanner::{CharSpan, Line, WhitespaceKind, scan_trailing_whitespace};
use crate::style::{Color, StyleConfig};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// A bounding box in view coordinates (device-independent pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// A box drawn over one trailing whitespace character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    /// The decorated character.
    pub span: CharSpan,
    /// Whether the character is a space or a tab.
    pub kind: WhitespaceKind,
    /// Position and size; the top-left matches the character geometry's top-left.
    pub bounds: Rect,
    /// Fill color.
    pub fill: Color,
    /// Border color.
    pub stroke: Color,
    /// Border thickness.
    pub stroke_thickness: f64,
}

/// The host surface overlays are drawn on. One layer per view.
pub trait OverlayLayer {
    /// Add an overlay.
    fn add(&mut self, overlay: Overlay);

    /// Remove every overlay whose span starts inside `range` (character offsets).
    fn remove_range(&mut self, range: Range<usize>);

    /// Remove every overlay.
    fn remove_all(&mut self);
}

/// The host's view of a document: laid-out lines, geometry and the overlay layer.
///
/// Each accessor may return `None` while the view is being torn down; the manager then simply
/// draws nothing.
pub trait TextView {
    /// The overlay layer type of this view.
    type Layer: OverlayLayer;

    /// All lines currently laid out in the view.
    fn visible_lines(&self) -> Option<Vec<Line>>;

    /// Screen geometry of one character, or `None` if it has no visual representation right now
    /// (e.g. scrolled out horizontally).
    fn marker_geometry(&self, span: CharSpan) -> Option<Rect>;

    /// The layer overlays are drawn on.
    fn overlay_layer(&mut self) -> Option<&mut Self::Layer>;
}

/// Errors raised when creating a [`DecorationManager`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecorationError {
    #[error("cannot decorate: the host did not provide a text view")]
    /// No view was supplied. This is a host contract violation.
    MissingView,
}

/// Draws trailing whitespace overlays for one view.
pub struct DecorationManager<V: TextView> {
    view: V,
    config: StyleConfig,
    registry: Weak<ConfigRegistry>,
    observer_id: Option<ObserverId>,
}

impl<V: TextView + 'static> DecorationManager<V> {
    /// Create a manager for `view` and register it with `registry`.
    ///
    /// Registration pushes the current configuration, which performs the initial full redraw.
    /// `view` is whatever the host resolved for the new text view; `None` is rejected.
    pub fn attach(
        view: Option<V>,
        registry: &Rc<ConfigRegistry>,
    ) -> Result<Rc<RefCell<Self>>, DecorationError> {
        let view = view.ok_or(DecorationError::MissingView)?;
        let manager = Rc::new(RefCell::new(Self {
            view,
            config: registry.config(),
            registry: Rc::downgrade(registry),
            observer_id: None,
        }));

        let id = registry.register(&manager);
        manager.borrow_mut().observer_id = Some(id);
        Ok(manager)
    }
}

impl<V: TextView> DecorationManager<V> {
    /// The configuration snapshot overlays are currently styled with.
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// The decorated view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the decorated view (e.g. to scroll it).
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Redecorate `lines` after the host laid them out again.
    ///
    /// Overlays previously drawn on each given line are discarded first. Overlays on other
    /// lines are left alone, unless the registry holds a snapshot this manager missed while it
    /// was borrowed: then every visible line is redrawn with it. Returns the number of overlays
    /// added.
    pub fn on_lines_changed<'a, I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = &'a Line>,
    {
        if self.catch_up() {
            return self.full_redraw();
        }

        let mut added = 0;
        for line in lines {
            let overlays = self.overlays_for_line(line);
            let Some(layer) = self.view.overlay_layer() else {
                return added;
            };
            layer.remove_range(line.range());
            added += overlays.len();
            for overlay in overlays {
                layer.add(overlay);
            }
        }
        added
    }

    /// Remove every overlay and redecorate all visible lines.
    ///
    /// A missing layer or line collection makes this a no-op. Returns the number of overlays
    /// added.
    pub fn full_redraw(&mut self) -> usize {
        let Some(lines) = self.view.visible_lines() else {
            tracing::debug!("view has no laid-out lines, skipping redraw");
            return 0;
        };
        let Some(layer) = self.view.overlay_layer() else {
            tracing::debug!("view has no overlay layer, skipping redraw");
            return 0;
        };

        layer.remove_all();
        self.catch_up();
        let added = self.on_lines_changed(&lines);
        tracing::debug!(lines = lines.len(), overlays = added, "full redraw");
        added
    }

    /// Adopt the registry's snapshot if it differs from ours. Returns `true` if it did.
    fn catch_up(&mut self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let latest = registry.config();
        if latest == self.config {
            return false;
        }
        tracing::debug!("picking up a config snapshot missed while busy");
        self.config = latest;
        true
    }

    fn overlays_for_line(&self, line: &Line) -> Vec<Overlay> {
        let mut overlays = Vec::new();
        for (span, kind) in scan_trailing_whitespace(line) {
            let Some(bounds) = self.view.marker_geometry(span) else {
                tracing::trace!(offset = span.offset, "no geometry for trailing whitespace");
                continue;
            };

            let brush = self.config.brush(kind);
            overlays.push(Overlay {
                span,
                kind,
                bounds,
                fill: brush.background,
                stroke: brush.border,
                stroke_thickness: brush.border_thickness,
            });
        }
        overlays
    }
}

impl<V: TextView> ConfigObserver for DecorationManager<V> {
    fn config_changed(&mut self, config: &StyleConfig) {
        self.config = *config;
        self.full_redraw();
    }
}

impl<V: TextView> Drop for DecorationManager<V> {
    fn drop(&mut self) {
        if let (Some(id), Some(registry)) = (self.observer_id, self.registry.upgrade()) {
            registry.unregister(id);
        }
    }
}
