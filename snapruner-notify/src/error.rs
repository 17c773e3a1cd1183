//! Error types for snapruner-notify.

use thiserror::Error;

/// All errors that can arise from a delivery attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The apprise process could not be started (other than "not installed",
    /// which is handled as a logged no-op).
    #[error("failed to launch apprise: {0}")]
    Spawn(#[source] std::io::Error),

    /// apprise ran but reported a delivery failure.
    #[error("apprise exited with code {code}: {stderr}")]
    Delivery { code: i32, stderr: String },
}
