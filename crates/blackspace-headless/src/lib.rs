#![warn(missing_docs)]
//! Blackspace Headless - Reference Host
//!
//! `blackspace-headless` implements every host-side trait of [`blackspace_core`] without a UI:
//!
//! - [`Document`]: shared rope-backed text, a [`TextBuffer`](blackspace_core::TextBuffer)
//! - [`HeadlessView`]: a monospace viewport, a [`TextView`](blackspace_core::TextView) drawing
//!   onto an [`OverlayCanvas`]
//! - [`JsonSettingsStore`]: a [`SettingsStore`](blackspace_core::SettingsStore) kept in a JSON
//!   file
//!
//! It backs the `blackspace` command line tool and the integration tests, and shows how a real
//! editor would wire the engine in.
//!
//! # Example
//!
//! ```rust
//! use blackspace_core::{ConfigRegistry, DecorationManager, MemorySettingsStore};
//! use blackspace_headless::{Document, HeadlessView, ViewOptions};
//! use std::rc::Rc;
//!
//! let registry = Rc::new(ConfigRegistry::new(MemorySettingsStore::new()));
//! let view = HeadlessView::new(Document::new("fn main() {}  \n"), ViewOptions::default());
//! let manager = DecorationManager::attach(Some(view), &registry).unwrap();
//!
//! let manager = manager.borrow();
//! let canvas = manager.view().canvas().unwrap();
//! assert_eq!(canvas.len(), 2);
//! ```

pub mod document;
pub mod settings;
pub mod view;

pub use document::{Document, RopeEdit};
pub use settings::JsonSettingsStore;
pub use view::{HeadlessView, OverlayCanvas, ViewOptions, cell_width_at, char_width};
