//! Save command interception.
//!
//! Hosts route commands through a chain of [`CommandTarget`]s. [`SaveCommandFilter`] sits in front
//! of the host's own handler: on a save command it trims the buffer first, then always forwards
//! the command. A save is never suppressed, even if trimming fails.

use crate::trim::{SaveTrimmer, TextBuffer};

/// A command routed through the host's command chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    /// Save the current item.
    SaveItem,
    /// Save every open item.
    SaveAll,
    /// Any other host command, identified by its host-specific id.
    Other(u32),
}

impl HostCommand {
    /// Returns `true` for the commands that trigger trim-on-save.
    pub fn is_save(&self) -> bool {
        matches!(self, Self::SaveItem | Self::SaveAll)
    }
}

/// Answer to a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandStatus {
    /// The command is known to some target in the chain.
    pub supported: bool,
    /// The command can run right now.
    pub enabled: bool,
}

impl CommandStatus {
    /// Supported and enabled.
    pub const AVAILABLE: Self = Self {
        supported: true,
        enabled: true,
    };
}

/// One link in the host's command chain.
pub trait CommandTarget {
    /// Error type of [`CommandTarget::exec`].
    type Error;

    /// Report whether `command` is supported/enabled.
    fn query_status(&mut self, command: HostCommand) -> CommandStatus;

    /// Execute `command`.
    fn exec(&mut self, command: HostCommand) -> Result<(), Self::Error>;
}

/// Trims `buffer` before forwarding save commands to `next`.
pub struct SaveCommandFilter<B, N> {
    buffer: B,
    trimmer: SaveTrimmer,
    next: N,
}

impl<B, N> SaveCommandFilter<B, N>
where
    B: TextBuffer,
    N: CommandTarget,
{
    /// Insert a filter in front of `next` for the view editing `buffer`.
    pub fn new(buffer: B, trimmer: SaveTrimmer, next: N) -> Self {
        Self {
            buffer,
            trimmer,
            next,
        }
    }

    /// The filtered buffer.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// The next target in the chain.
    pub fn next(&self) -> &N {
        &self.next
    }

    /// Remove the filter, returning the buffer and the next target.
    pub fn into_parts(self) -> (B, N) {
        (self.buffer, self.next)
    }
}

impl<B, N> CommandTarget for SaveCommandFilter<B, N>
where
    B: TextBuffer,
    N: CommandTarget,
{
    type Error = N::Error;

    fn query_status(&mut self, command: HostCommand) -> CommandStatus {
        if command.is_save() {
            return CommandStatus::AVAILABLE;
        }
        self.next.query_status(command)
    }

    fn exec(&mut self, command: HostCommand) -> Result<(), Self::Error> {
        if command.is_save() {
            match self.trimmer.on_save(&mut self.buffer) {
                Ok(Some(report)) => tracing::debug!(
                    ?command,
                    lines = report.lines_trimmed,
                    "trimmed before save"
                ),
                Ok(None) => {}
                Err(err) => tracing::warn!(?command, error = %err, "trim before save failed"),
            }
        }
        self.next.exec(command)
    }
}
