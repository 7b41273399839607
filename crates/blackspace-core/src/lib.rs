#![warn(missing_docs)]
//! Blackspace Core - Headless Trailing Whitespace Engine
//!
//! # Overview
//!
//! `blackspace-core` highlights spaces and tabs at the end of lines and optionally strips
//! trailing whitespace before a buffer is saved. It does not render anything itself: the host
//! editor supplies laid-out lines, character geometry and an overlay surface through small
//! traits, and the engine decides what to draw where.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SaveCommandFilter / SaveTrimmer            │  ← Save pipeline
//! ├─────────────────────────────────────────────┤
//! │  DecorationManager (one per view)           │  ← Overlays
//! ├─────────────────────────────────────────────┤
//! │  ConfigRegistry (one per process)           │  ← Live settings + observers
//! ├─────────────────────────────────────────────┤
//! │  StyleConfig / SettingsStore                │  ← Settings values + persistence
//! ├─────────────────────────────────────────────┤
//! │  Trailing whitespace scanner                │  ← Per-line scan
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use blackspace_core::{Line, WhitespaceKind, scan_trailing_whitespace};
//!
//! let line = Line::new(0, "let x = 1;\t ");
//! let found: Vec<_> = scan_trailing_whitespace(&line).collect();
//!
//! assert_eq!(found.len(), 2);
//! assert_eq!(found[0].0.offset, 11);
//! assert_eq!(found[0].1, WhitespaceKind::Space);
//! assert_eq!(found[1].1, WhitespaceKind::Tab);
//! ```
//!
//! # Threading
//!
//! Everything runs on the host's UI thread. Managers live in `Rc<RefCell<_>>` and the registry
//! keeps `Weak` handles to them, so none of the stateful types are `Send`.
//!
//! # Module Description
//!
//! - [`scanner`] - trailing space/tab scan of a single line
//! - [`style`] - colors, brushes and the [`StyleConfig`] snapshot
//! - [`settings`] - host persistence trait and an in-memory store
//! - [`registry`] - the process-wide [`ConfigRegistry`]
//! - [`decorations`] - per-view [`DecorationManager`]
//! - [`trim`] - trim-on-save transaction logic
//! - [`commands`] - save command interception

pub mod commands;
pub mod decorations;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod style;
pub mod trim;

pub use commands::{CommandStatus, CommandTarget, HostCommand, SaveCommandFilter};
pub use decorations::{DecorationError, DecorationManager, Overlay, OverlayLayer, Rect, TextView};
pub use registry::{ConfigObserver, ConfigRegistry, ObserverId, SETTINGS_COLLECTION, keys};
pub use scanner::{CharSpan, Line, TrailingWhitespace, WhitespaceKind, scan_trailing_whitespace};
pub use settings::{MemorySettingsStore, SettingsStore, StoreError, StoredValue};
pub use style::{BrushSettings, Color, ColorParseError, StyleConfig};
pub use trim::{EditError, SaveTrimmer, TextBuffer, TextEdit, TrimReport, trailing_trim_start};
