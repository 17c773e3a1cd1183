//! Notification delivery via the `apprise` CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

use snapruner_core::AppriseConfig;
use snapruner_run::Notifier;

use crate::error::NotifyError;

const SUCCESS_BODY: &str = "SnapRAID job completed successfully";
const FAILURE_BODY: &str = "Error during SnapRAID job";

/// Sends run notifications by invoking the `apprise` command-line client
/// with the configured destination URLs.
#[derive(Debug, Clone)]
pub struct AppriseNotifier {
    program: PathBuf,
    urls: Vec<String>,
    attach_log: Option<PathBuf>,
}

impl AppriseNotifier {
    /// `attach_log` is the run's log attachment file, when attachment mode
    /// is configured; it is removed after the delivery attempt.
    pub fn new(config: &AppriseConfig, attach_log: Option<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("apprise"),
            urls: config.urls.clone(),
            attach_log,
        }
    }

    /// Use a different delivery binary. Tests point this at a stub.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn deliver(&self, success: bool) -> Result<(), NotifyError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-b").arg(body_for(success));
        if let Some(attach) = &self.attach_log {
            cmd.arg("--attach").arg(attach);
        }
        for url in &self.urls {
            cmd.arg(url);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    "failed to send notifications because the apprise CLI is not installed"
                );
                return Ok(());
            }
            Err(err) => return Err(NotifyError::Spawn(err)),
        };

        // The attachment is single-use: remove it whether or not apprise
        // managed to read it.
        if let Some(attach) = &self.attach_log {
            remove_attachment(attach);
        }

        if output.status.success() {
            tracing::info!("notification sent to {} destination(s)", self.urls.len());
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(NotifyError::Delivery {
                code: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

impl Notifier for AppriseNotifier {
    fn notify(&self, success: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.urls.is_empty() {
            tracing::debug!("no notification urls configured, skipping");
            return Ok(());
        }
        self.deliver(success).map_err(Into::into)
    }
}

fn body_for(success: bool) -> &'static str {
    if success {
        SUCCESS_BODY
    } else {
        FAILURE_BODY
    }
}

/// Removal failure must never propagate; the run result is already decided.
fn remove_attachment(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to remove notification attachment",
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn stub_apprise(dir: &TempDir, exit_code: i32) -> (PathBuf, PathBuf) {
        let args_file = dir.path().join("apprise-args.txt");
        let program = dir.path().join("apprise");
        fs::write(
            &program,
            format!(
                "#!/bin/sh\necho \"$@\" > \"{}\"\nexit {exit_code}",
                args_file.display()
            ),
        )
        .expect("write stub");
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).expect("chmod stub");
        (program, args_file)
    }

    fn notifier(urls: &[&str], attach: Option<PathBuf>) -> AppriseNotifier {
        let config = AppriseConfig {
            urls: urls.iter().map(|s| (*s).to_owned()).collect(),
            send_on: "success,error".to_owned(),
            attach_log: attach.is_some(),
            short: false,
        };
        AppriseNotifier::new(&config, attach)
    }

    #[test]
    fn no_urls_skips_delivery() {
        let dir = TempDir::new().expect("tempdir");
        let (program, args_file) = stub_apprise(&dir, 0);
        let notifier = notifier(&[], None).with_program(program);

        notifier.notify(true).expect("skip is not an error");
        assert!(!args_file.exists(), "apprise must not be invoked");
    }

    #[test]
    fn delivery_passes_body_attachment_and_urls() {
        let dir = TempDir::new().expect("tempdir");
        let (program, args_file) = stub_apprise(&dir, 0);
        let attach = dir.path().join("snapruner_2026-01-01.log");
        fs::write(&attach, "log body").expect("write attachment");
        let notifier =
            notifier(&["json://a", "json://b"], Some(attach.clone())).with_program(program);

        notifier.notify(true).expect("deliver");

        let recorded = fs::read_to_string(&args_file).expect("read args");
        assert_eq!(
            recorded.trim_end(),
            format!(
                "-b {SUCCESS_BODY} --attach {} json://a json://b",
                attach.display()
            )
        );
        assert!(!attach.exists(), "attachment removed after delivery");
    }

    #[test]
    fn failure_body_is_used_for_failed_runs() {
        let dir = TempDir::new().expect("tempdir");
        let (program, args_file) = stub_apprise(&dir, 0);
        let notifier = notifier(&["json://a"], None).with_program(program);

        notifier.notify(false).expect("deliver");

        let recorded = fs::read_to_string(&args_file).expect("read args");
        assert!(recorded.contains(FAILURE_BODY));
    }

    #[test]
    fn delivery_failure_surfaces_and_still_removes_attachment() {
        let dir = TempDir::new().expect("tempdir");
        let (program, _args_file) = stub_apprise(&dir, 1);
        let attach = dir.path().join("snapruner_2026-01-01.log");
        fs::write(&attach, "log body").expect("write attachment");
        let notifier = notifier(&["json://a"], Some(attach.clone())).with_program(program);

        let err = notifier.notify(true).expect_err("delivery must fail");
        assert!(err.to_string().contains("exited with code 1"));
        assert!(!attach.exists(), "attachment removed even on failure");
    }

    #[test]
    fn missing_binary_is_a_logged_no_op() {
        let dir = TempDir::new().expect("tempdir");
        let attach = dir.path().join("snapruner_2026-01-01.log");
        fs::write(&attach, "log body").expect("write attachment");
        let notifier = notifier(&["json://a"], Some(attach.clone()))
            .with_program(dir.path().join("not-installed"));

        notifier.notify(true).expect("soft failure");
        assert!(attach.exists(), "no delivery attempt, no removal");
    }
}
