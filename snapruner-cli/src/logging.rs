//! Logging sinks for a run: console, optional rotating log file, optional
//! notification attachment file.
//!
//! Stream identity is carried by event target rather than custom levels:
//! snapraid stdout lines arrive at INFO under `snapraid::stdout`, stderr
//! lines at WARN under `snapraid::stderr`. The attachment sink's "short"
//! mode drops the stdout target so the notification carries only the run
//! summary. Every file sink writes one formatted event at a time behind a
//! mutex, so lines from the two tee threads never interleave mid-line.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use snapruner_core::RunConfig;
use snapruner_run::STDOUT_TARGET;

/// Number of rotated backups kept next to the live log file.
const MAX_ROTATED_FILES: usize = 9;

/// Paths produced by logging setup that the rest of the program needs.
#[derive(Debug, Default)]
pub struct LoggingPaths {
    /// Attachment file for the notifier, when `apprise.attach-log` is set.
    pub attach_log: Option<PathBuf>,
}

/// Assemble and install the global subscriber for this run.
pub fn init(config: &RunConfig) -> anyhow::Result<LoggingPaths> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stdout);

    let file_layer = match &config.logging.file {
        Some(path) => {
            let writer =
                RotatingFileWriter::create(path.clone(), max_bytes(config.logging.max_size_kib))
                    .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let mut paths = LoggingPaths::default();
    let attach_layer = if config.apprise.attach_log {
        let path = attachment_path();
        let writer = RotatingFileWriter::create(path.clone(), 0).with_context(|| {
            format!("cannot open notification attachment {}", path.display())
        })?;
        let short = config.apprise.short;
        paths.attach_log = Some(path);
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter_fn(move |meta| {
                    !(short && meta.target() == STDOUT_TARGET)
                })),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .with(attach_layer)
        .try_init()
        .context("logging subscriber already installed")?;

    Ok(paths)
}

/// `<tempdir>/snapruner_<date>.log`; the fixed name lets a crashed run's
/// leftover file be reused by the next run on the same day.
fn attachment_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "snapruner_{}.log",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

fn max_bytes(max_size_kib: i64) -> u64 {
    u64::try_from(max_size_kib).unwrap_or(0).saturating_mul(1024)
}

// ---------------------------------------------------------------------------
// Rotating file writer
// ---------------------------------------------------------------------------

/// Append-only log file writer shared by tracing layers.
///
/// When `max_bytes` is non-zero the file rotates before the write that would
/// cross the limit, keeping up to [`MAX_ROTATED_FILES`] numbered backups
/// (`run.log` → `run.log.1` → … → `run.log.9`). With `max_bytes == 0` it is
/// a plain serialized appender, which is what the attachment sink uses.
struct RotatingFileWriter {
    inner: Mutex<WriterState>,
}

struct WriterState {
    path: PathBuf,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    fn create(path: PathBuf, max_bytes: u64) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            inner: Mutex::new(WriterState {
                path,
                max_bytes,
                file,
                written,
            }),
        })
    }

    fn write_event(&self, buf: &[u8]) -> io::Result<()> {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.max_bytes > 0 && state.written + buf.len() as u64 > state.max_bytes {
            state.rotate()?;
        }
        state.file.write_all(buf)?;
        state.written += buf.len() as u64;
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.file.flush()
    }
}

impl WriterState {
    /// Shift backups up by one, move the live file to `.1`, start fresh.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = numbered_path(&self.path, MAX_ROTATED_FILES);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for n in (1..MAX_ROTATED_FILES).rev() {
            let src = numbered_path(&self.path, n);
            if src.exists() {
                std::fs::rename(&src, numbered_path(&self.path, n + 1))?;
            }
        }
        std::fs::rename(&self.path, numbered_path(&self.path, 1))?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

/// Build the path for the `n`-th rotated copy of `base` (e.g. `run.log.2`).
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("snapruner.log");
    base.with_file_name(format!("{name}.{n}"))
}

/// Per-event handle; the mutex inside [`RotatingFileWriter`] does the actual
/// serialization.
struct EventWriter<'a>(&'a RotatingFileWriter);

impl io::Write for EventWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_event(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = EventWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
