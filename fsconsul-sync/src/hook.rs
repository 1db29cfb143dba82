//! On-change hook execution.
//!
//! The configured command runs through the platform shell with inherited
//! stdio and is awaited to completion. Its result is logged and returned but
//! never stops the watcher.

use std::process::ExitStatus;

use tokio::process::Command;

/// How a hook invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Succeeded,
    /// Non-zero exit; `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    /// The shell could not be started.
    SpawnFailed(String),
}

impl HookOutcome {
    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            HookOutcome::Succeeded
        } else {
            HookOutcome::Failed {
                code: status.code(),
            }
        }
    }
}

/// Run `command` once and wait for it. Dropping the returned future kills
/// the child.
pub async fn run_on_change(command: &str) -> HookOutcome {
    run_command(shell(command), command).await
}

async fn run_command(mut cmd: Command, label: &str) -> HookOutcome {
    let outcome = match cmd.kill_on_drop(true).status().await {
        Ok(status) => HookOutcome::from_status(status),
        Err(err) => HookOutcome::SpawnFailed(err.to_string()),
    };

    match &outcome {
        HookOutcome::Succeeded => tracing::info!(command = label, "on-change hook finished"),
        HookOutcome::Failed { code } => {
            tracing::warn!(command = label, code = ?code, "on-change hook exited with failure")
        }
        HookOutcome::SpawnFailed(error) => {
            tracing::error!(command = label, error = %error, "on-change hook could not be started")
        }
    }
    outcome
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
