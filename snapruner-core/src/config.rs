//! YAML configuration loader with one-shot type coercion.
//!
//! The file carries four sections (`snapraid`, `logging`, `apprise`,
//! `scrub`), every one of them optional. Each field is coerced to its
//! declared type exactly once, here: an int field holding anything that is
//! not an integer becomes 0, a bool field becomes false, a string field
//! becomes the empty string. Downstream code therefore never branches on a
//! value of unexpected shape.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::ConfigError;
use crate::types::{AppriseConfig, LoggingConfig, RunConfig, ScrubConfig, SnapraidConfig};

// ---------------------------------------------------------------------------
// Loader entry point
// ---------------------------------------------------------------------------

/// Command-line switches that take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    /// `Some(false)` when scrubbing was disabled on the command line.
    pub scrub: Option<bool>,
    /// Disable the delete-threshold gate for this run.
    pub ignore_delete_threshold: bool,
}

/// Load and normalize the configuration at `path`.
pub fn load(path: &Path, overrides: CliOverrides) -> Result<RunConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize(raw, overrides))
}

// ---------------------------------------------------------------------------
// Raw shape and normalization
// ---------------------------------------------------------------------------

/// The file as parsed: sections kept as raw YAML so that coercion below can
/// tolerate any value shape (a missing section is simply null).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    snapraid: Value,
    logging: Value,
    apprise: Value,
    scrub: Value,
}

fn normalize(raw: RawConfig, overrides: CliOverrides) -> RunConfig {
    let mut snapraid = SnapraidConfig {
        executable: PathBuf::from(str_field(&raw.snapraid, "executable")),
        config: PathBuf::from(str_field(&raw.snapraid, "config")),
        delete_threshold: int_field(&raw.snapraid, "deletethreshold"),
        touch: bool_field(&raw.snapraid, "touch"),
    };
    if overrides.ignore_delete_threshold {
        snapraid.delete_threshold = -1;
    }

    let file = str_field(&raw.logging, "file");
    let logging = LoggingConfig {
        file: if file.is_empty() {
            None
        } else {
            Some(PathBuf::from(file))
        },
        max_size_kib: int_field(&raw.logging, "maxsize"),
    };

    let apprise = AppriseConfig {
        urls: list_field(&raw.apprise, "urls"),
        send_on: str_field(&raw.apprise, "sendon"),
        attach_log: bool_field(&raw.apprise, "attach-log"),
        short: bool_field(&raw.apprise, "short"),
    };

    let mut scrub = ScrubConfig {
        enabled: bool_field(&raw.scrub, "enabled"),
        plan: text_field(&raw.scrub, "plan"),
        older_than: int_field(&raw.scrub, "older-than"),
    };
    // Legacy key: a non-empty `percentage` overwrites `plan`.
    let percentage = text_field(&raw.scrub, "percentage");
    if !percentage.is_empty() {
        scrub.plan = percentage;
    }
    if let Some(enabled) = overrides.scrub {
        scrub.enabled = enabled;
    }

    RunConfig {
        snapraid,
        logging,
        apprise,
        scrub,
    }
}

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

fn str_field(section: &Value, key: &str) -> String {
    match section.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn int_field(section: &Value, key: &str) -> i64 {
    section.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn bool_field(section: &Value, key: &str) -> bool {
    section.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// String-or-number field; numbers are normalized to their decimal string.
fn text_field(section: &Value, key: &str) -> String {
    match section.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// List of strings; a single scalar string is accepted as a one-element
/// list, non-string entries are dropped.
fn list_field(section: &Value, key: &str) -> Vec<String> {
    match section.get(key) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
