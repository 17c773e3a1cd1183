//! Error types for snapruner-run.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise during a maintenance run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configured snapraid binary does not resolve to a regular file.
    #[error("the configured snapraid executable \"{}\" does not exist or is not a file", .path.display())]
    ExecutableMissing { path: PathBuf },

    /// snapraid's own configuration file does not resolve to a regular file.
    #[error("snapraid config does not exist at {}", .path.display())]
    ToolConfigMissing { path: PathBuf },

    /// The child process could not be started at all.
    #[error("failed to launch snapraid {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O failure while draining output or waiting on the child.
    #[error("I/O failure while running snapraid {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a code that was neither zero nor allowlisted.
    #[error("snapraid {command} failed with exit code {code}")]
    Command { command: String, code: i32 },

    /// The diff reported more removals than the configured gate permits.
    #[error("deleted files exceed delete threshold of {threshold} ({removed} removed), aborting")]
    ThresholdExceeded { removed: u64, threshold: i64 },
}

/// Convenience constructor for [`RunError::Io`].
pub(crate) fn io_err(command: &str, source: std::io::Error) -> RunError {
    RunError::Io {
        command: command.to_owned(),
        source,
    }
}
