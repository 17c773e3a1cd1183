//! # snapruner-run
//!
//! The command-execution and decision engine behind a maintenance run:
//! line-oriented stream tees, the snapraid subprocess runner, diff-output
//! analysis, and the run pipeline that sequences
//! touch → diff → threshold gate → sync → scrub and funnels every exit path
//! through a single finalize routine.
//!
//! Call [`pipeline::run`] with a loaded [`snapruner_core::RunConfig`] and a
//! [`Notifier`]; translate the returned [`RunOutcome`] into a process exit
//! code at the binary entry point.

pub mod diff;
pub mod error;
pub mod pipeline;
pub mod process;

pub use diff::DiffCounts;
pub use error::RunError;
pub use pipeline::{run, Notifier, RunOutcome};
pub use process::{
    tee_stream, CommandOutput, SnapraidRunner, StreamKind, STDERR_TARGET, STDOUT_TARGET,
};
