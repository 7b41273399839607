use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blackspace")]
#[command(about = "Report and trim trailing whitespace")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
    /// Settings file (defaults to <config dir>/blackspace/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List lines that end in spaces or tabs
    Check {
        /// Files to inspect
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Save files with trailing whitespace removed
    Trim {
        /// Files to trim in place
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Trim even if trim-on-save is turned off in the settings
        #[arg(long)]
        force: bool,
    },
    /// Show or change highlight settings
    Config {
        /// Config subcommand action.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print every setting
    Show,
    /// Change one setting, e.g. `set TabsBorderColor "#ff3b0085"`
    Set {
        /// Property name (case-insensitive)
        key: String,
        /// New value
        value: String,
    },
    /// Restore the defaults
    Reset,
}
