//! The run lifecycle: preconditions, touch, diff, threshold gate, sync,
//! scrub, and the single finalize path every outcome funnels through.
//!
//! Steps run strictly in sequence; the only concurrency in the system is the
//! per-command pair of stream tees inside [`SnapraidRunner`]. There is no
//! timeout on the external tool: a hung snapraid hangs the run.

use snapruner_core::{RunConfig, ScrubConfig};

use crate::diff::{self, DiffCounts};
use crate::error::RunError;
use crate::process::SnapraidRunner;

/// `snapraid diff` exits 2 when differences were found; that is a signal,
/// not an error.
const DIFF_CHANGES_EXIT_CODE: i32 = 2;

/// Delivers the end-of-run notification.
///
/// Implementations are best-effort: the run outcome is already decided by
/// the time a notifier runs, and any error it returns is logged and
/// swallowed by the finalize routine.
pub trait Notifier {
    fn notify(&self, success: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Terminal result of a run. Only the binary entry point translates this
/// into a process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// The run stopped at a safety gate before touching parity data.
    Aborted(String),
    Failure(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Run the full maintenance pipeline and finalize exactly once, whatever
/// the exit path.
pub fn run(config: &RunConfig, notifier: &dyn Notifier) -> RunOutcome {
    let outcome = match execute(config) {
        Ok(()) => RunOutcome::Success,
        Err(err) => {
            tracing::error!("{err}");
            let message = err.to_string();
            if matches!(err, RunError::ThresholdExceeded { .. }) {
                tracing::error!("Run again with --ignore-deletethreshold to sync anyways");
                RunOutcome::Aborted(message)
            } else {
                RunOutcome::Failure(message)
            }
        }
    };
    finalize(config, notifier, &outcome);
    outcome
}

/// Single convergence point for every exit path.
///
/// Must not fail: a notifier error is logged and swallowed so the process
/// still exits with the outcome's code.
fn finalize(config: &RunConfig, notifier: &dyn Notifier, outcome: &RunOutcome) {
    let success = outcome.is_success();
    if config.apprise.wants_notification(success) {
        if let Err(err) = notifier.notify(success) {
            tracing::error!("failed to send notification: {err}");
        }
    }
    if success {
        tracing::info!("Run finished successfully");
    } else {
        tracing::error!("Run failed");
    }
}

fn execute(config: &RunConfig) -> Result<(), RunError> {
    let rule = "=".repeat(60);
    tracing::info!("{rule}");
    tracing::info!("Run started");
    tracing::info!("{rule}");

    check_preconditions(config)?;
    let runner = SnapraidRunner::new(&config.snapraid);

    if config.snapraid.touch {
        tracing::info!("Running touch...");
        runner.execute("touch", &[], &[])?;
        log_step_rule();
    }

    tracing::info!("Running diff...");
    let diff_output = runner.execute("diff", &[], &[DIFF_CHANGES_EXIT_CODE])?;
    log_step_rule();

    let counts = diff::analyze(&diff_output.lines);
    tracing::info!(
        "Diff results: {} added,  {} removed,  {} moved,  {} modified",
        counts.added,
        counts.removed,
        counts.moved,
        counts.updated
    );
    check_delete_threshold(config.snapraid.delete_threshold, &counts)?;

    if counts.total() == 0 {
        tracing::info!("No changes detected, no sync required");
    } else {
        tracing::info!("Running sync...");
        runner.execute("sync", &[], &[])?;
        log_step_rule();
    }

    if config.scrub.enabled {
        tracing::info!("Running scrub...");
        runner.execute("scrub", &scrub_args(&config.scrub), &[])?;
        log_step_rule();
    }

    tracing::info!("All done");
    Ok(())
}

fn log_step_rule() {
    tracing::info!("{}", "*".repeat(60));
}

/// Fail fast before any command runs when the tool itself is missing.
fn check_preconditions(config: &RunConfig) -> Result<(), RunError> {
    if !config.snapraid.executable.is_file() {
        return Err(RunError::ExecutableMissing {
            path: config.snapraid.executable.clone(),
        });
    }
    if !config.snapraid.config.is_file() {
        return Err(RunError::ToolConfigMissing {
            path: config.snapraid.config.clone(),
        });
    }
    Ok(())
}

/// The gate is inclusive: a removal count equal to the threshold proceeds.
fn check_delete_threshold(threshold: i64, counts: &DiffCounts) -> Result<(), RunError> {
    if threshold >= 0 && counts.removed > threshold as u64 {
        return Err(RunError::ThresholdExceeded {
            removed: counts.removed,
            threshold,
        });
    }
    Ok(())
}

/// Build scrub arguments. `older-than` only applies to percentage plans;
/// snapraid rejects it for named plans.
fn scrub_args(scrub: &ScrubConfig) -> Vec<(&'static str, String)> {
    if scrub.plan.parse::<i64>().is_ok() {
        vec![
            ("plan", scrub.plan.clone()),
            ("older-than", scrub.older_than.to_string()),
        ]
    } else {
        vec![("plan", scrub.plan.clone())]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
