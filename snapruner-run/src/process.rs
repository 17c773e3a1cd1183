//! Subprocess execution with concurrent stdout/stderr capture.
//!
//! snapraid interleaves progress output across stdout and stderr, and a
//! child process blocks as soon as one of its pipes fills while nothing
//! drains it. Each stream therefore gets its own tee thread that logs every
//! line as it arrives; stdout is additionally captured for later analysis.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use snapruner_core::SnapraidConfig;

use crate::error::{io_err, RunError};

/// Event target for snapraid stdout lines (logged at INFO).
pub const STDOUT_TARGET: &str = "snapraid::stdout";

/// Event target for snapraid stderr lines (logged at WARN).
pub const STDERR_TARGET: &str = "snapraid::stderr";

/// Pause after a command exits so trailing flushes do not mix into the next
/// command's log lines.
const OUTPUT_SETTLE: Duration = Duration::from_millis(300);

/// Which child stream a tee drains; decides log severity and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Captured result of one snapraid invocation: stdout lines in production
/// order plus the exit code. Created fresh per command and owned by the
/// caller; nothing persists across steps.
#[derive(Debug)]
pub struct CommandOutput {
    pub command: String,
    pub lines: Vec<String>,
    pub exit_code: i32,
}

/// Drain `stream` to end-of-stream, line by line.
///
/// Lines are decoded as UTF-8 with replacement (snapraid's output is not
/// guaranteed byte-clean across platforms), logged with the trailing
/// terminator stripped, and, when `capture` is set, collected into the
/// returned buffer. A read error ends the tee early and is surfaced to the
/// caller. The stream handle is closed on return.
pub fn tee_stream<R: Read>(
    stream: R,
    kind: StreamKind,
    capture: bool,
) -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(stream);
    let mut raw = Vec::new();
    let mut lines = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.trim_end_matches(['\n', '\r']);
        match kind {
            StreamKind::Stdout => tracing::info!(target: STDOUT_TARGET, "{line}"),
            StreamKind::Stderr => tracing::warn!(target: STDERR_TARGET, "{line}"),
        }
        if capture {
            lines.push(line.to_owned());
        }
    }
    Ok(lines)
}

/// Launches snapraid commands with the fixed global-flag convention:
/// `<executable> <command> --conf <config> --quiet [--<key> <value>...]`.
#[derive(Debug, Clone)]
pub struct SnapraidRunner {
    executable: PathBuf,
    tool_config: PathBuf,
}

impl SnapraidRunner {
    pub fn new(config: &SnapraidConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            tool_config: config.config.clone(),
        }
    }

    /// Run `snapraid <command>` and capture its stdout.
    ///
    /// Extra `args` become long options (`--key value`). A non-zero exit
    /// code fails with [`RunError::Command`] unless listed in
    /// `allowed_exit_codes`. Both tee threads are joined before the child is
    /// waited on, so all output is logged before the result is reported.
    pub fn execute(
        &self,
        command: &str,
        args: &[(&str, String)],
        allowed_exit_codes: &[i32],
    ) -> Result<CommandOutput, RunError> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(command)
            .arg("--conf")
            .arg(&self.tool_config)
            .arg("--quiet");
        for (key, value) in args {
            cmd.arg(format!("--{key}")).arg(value);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::debug!(command, "launching snapraid");
        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            command: command.to_owned(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_drain, stderr_drain) = thread::scope(|scope| {
            let stdout_tee = scope.spawn(move || match stdout {
                Some(stream) => tee_stream(stream, StreamKind::Stdout, true),
                None => Ok(Vec::new()),
            });
            let stderr_tee = scope.spawn(move || match stderr {
                Some(stream) => tee_stream(stream, StreamKind::Stderr, false),
                None => Ok(Vec::new()),
            });
            (join_tee(stdout_tee), join_tee(stderr_tee))
        });

        let status = child.wait().map_err(|source| io_err(command, source))?;
        thread::sleep(OUTPUT_SETTLE);

        stderr_drain.map_err(|source| io_err(command, source))?;
        let lines = stdout_drain.map_err(|source| io_err(command, source))?;

        let exit_code = status.code().unwrap_or(-1);
        if exit_code == 0 || allowed_exit_codes.contains(&exit_code) {
            Ok(CommandOutput {
                command: command.to_owned(),
                lines,
                exit_code,
            })
        } else {
            Err(RunError::Command {
                command: command.to_owned(),
                code: exit_code,
            })
        }
    }
}

fn join_tee(
    handle: thread::ScopedJoinHandle<'_, std::io::Result<Vec<String>>>,
) -> std::io::Result<Vec<String>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "stream tee thread panicked",
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
