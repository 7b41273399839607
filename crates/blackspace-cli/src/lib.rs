//! Command line front end for blackspace.
//!
//! ```text
//! blackspace check src/*.rs
//! blackspace trim --force notes.md
//! blackspace config set TabsBorderColor "255, 59, 0, 133"
//! ```

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command, ConfigAction};
pub use commands::{Outcome, default_settings_path, run};
