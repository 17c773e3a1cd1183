//! snapruner — scheduled snapraid maintenance with safety gating and
//! notifications.
//!
//! # Usage
//!
//! ```text
//! snapruner [-c|--conf CONFIG] [--no-scrub] [--ignore-deletethreshold]
//! ```
//!
//! One invocation is one run: touch (optional) → diff → delete-threshold
//! gate → sync → scrub (optional), with the outcome notified via Apprise.
//! Exit codes: 0 success, 1 failed or aborted run, 2 setup failure before
//! the run started.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use snapruner_core::config::{self, CliOverrides};
use snapruner_notify::AppriseNotifier;
use snapruner_run::{pipeline, RunOutcome};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "snapruner",
    version,
    about = "Run snapraid touch/diff/sync/scrub as one guarded maintenance job",
    long_about = None,
)]
struct Cli {
    /// Configuration file
    #[arg(
        short = 'c',
        long = "conf",
        value_name = "CONFIG",
        default_value = "snapruner.yml"
    )]
    conf: PathBuf,

    /// Do not scrub (overrides config)
    #[arg(long)]
    no_scrub: bool,

    /// Sync even if the configured delete threshold is exceeded
    #[arg(long)]
    ignore_deletethreshold: bool,
}

/// Exit code for failures before the run proper starts (config, logging).
const SETUP_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.conf.exists() {
        eprintln!(
            "snapruner configuration file not found: {}",
            cli.conf.display()
        );
        eprintln!("see snapruner --help");
        return ExitCode::from(SETUP_FAILURE);
    }

    let overrides = CliOverrides {
        scrub: cli.no_scrub.then_some(false),
        ignore_delete_threshold: cli.ignore_deletethreshold,
    };
    let config = match config::load(&cli.conf, overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    let paths = match logging::init(&config) {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("failed to set up logging: {err:#}");
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    let notifier = AppriseNotifier::new(&config.apprise, paths.attach_log);
    match pipeline::run(&config, &notifier) {
        RunOutcome::Success => ExitCode::SUCCESS,
        RunOutcome::Aborted(_) | RunOutcome::Failure(_) => ExitCode::FAILURE,
    }
}
