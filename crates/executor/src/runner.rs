//! Shell command execution.
//!
//! This is the trust boundary of the service: command strings from the
//! mapping file are handed to `sh -c` verbatim, with full shell
//! semantics (pipes, redirection, globbing). Nothing here inspects or
//! sandboxes the command.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::Result;

/// Fixed stderr text reported for a timed-out command.
pub const TIMEOUT_STDERR: &str = "Command timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Failed,
    Timeout,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub alert: String,
    pub alert_id: String,
    pub command: String,
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs one command through the shell and converts its outcome
    /// into an `ExecutionResult`. Non-zero exit and timeout are normal
    /// result values here, not errors; only a failed spawn surfaces as
    /// `Err`.
    pub async fn run(&self, alert: &str, alert_id: &str, command: &str) -> Result<ExecutionResult> {
        info!("Executing command: {}", command);

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                // The elapsed timeout drops the wait future and with it
                // the child handle; kill_on_drop terminates the
                // process.
                error!("Command timed out after {:?}: {}", self.timeout, command);
                return Ok(ExecutionResult {
                    alert: alert.to_string(),
                    alert_id: alert_id.to_string(),
                    command: command.to_string(),
                    status: CommandStatus::Timeout,
                    stdout: String::new(),
                    stderr: TIMEOUT_STDERR.to_string(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        let status = if output.status.success() {
            info!("STDOUT: {}", stdout);
            if !stderr.is_empty() {
                warn!("STDERR: {}", stderr);
            }
            CommandStatus::Success
        } else {
            error!("Command exited with {}: {}", output.status, command);
            error!(
                "STDOUT: {}",
                if stdout.is_empty() { "(empty)" } else { stdout.as_str() }
            );
            error!(
                "STDERR: {}",
                if stderr.is_empty() { "(empty)" } else { stderr.as_str() }
            );
            CommandStatus::Failed
        };

        Ok(ExecutionResult {
            alert: alert.to_string(),
            alert_id: alert_id.to_string(),
            command: command.to_string(),
            status,
            stdout,
            stderr,
        })
    }
}
