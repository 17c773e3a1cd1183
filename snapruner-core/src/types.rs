//! Typed run configuration.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Instances are produced exclusively by [`crate::config::load`],
//! which has already coerced every field to its declared type; consumers
//! never see a value of unexpected shape.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The `snapraid` section: where the tool lives and how the run is gated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapraidConfig {
    /// Path to the snapraid binary.
    pub executable: PathBuf,
    /// Path to snapraid's own configuration file, passed as `--conf`.
    pub config: PathBuf,
    /// Maximum number of removed files a sync may apply; negative disables
    /// the gate entirely.
    pub delete_threshold: i64,
    /// Run `touch` before `diff` to fix zero sub-second timestamps.
    pub touch: bool,
}

/// The `logging` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log file path; `None` disables file logging.
    pub file: Option<PathBuf>,
    /// Rotation threshold in KiB; zero or negative disables rotation.
    pub max_size_kib: i64,
}

/// The `apprise` section: notification destinations and delivery options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppriseConfig {
    /// Apprise destination URLs.
    pub urls: Vec<String>,
    /// Channel subscription, matched by substring: a notification is sent
    /// only when this contains `"success"` (resp. `"error"`).
    pub send_on: String,
    /// Attach the run log file to the notification.
    pub attach_log: bool,
    /// Keep the attachment short by leaving out snapraid's stdout.
    pub short: bool,
}

impl AppriseConfig {
    /// Whether the configured subscription covers this outcome's channel.
    pub fn wants_notification(&self, success: bool) -> bool {
        let channel = if success { "success" } else { "error" };
        self.send_on.contains(channel)
    }
}

/// The `scrub` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubConfig {
    /// Run `scrub` at the end of the pipeline.
    pub enabled: bool,
    /// Scrub plan: a percentage number (normalized to its decimal string) or
    /// a named plan token such as `new` or `bad`.
    pub plan: String,
    /// Age filter in days; only passed along for percentage plans.
    pub older_than: i64,
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Immutable snapshot of everything a run needs, built once by the loader
/// and passed by reference into every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub snapraid: SnapraidConfig,
    pub logging: LoggingConfig,
    pub apprise: AppriseConfig,
    pub scrub: ScrubConfig,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
