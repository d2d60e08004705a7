//! Unix process operations implementation
//!
//! Children inherit stdin, stdout and stderr. While a child runs, an
//! interactive interrupt (SIGINT) is absorbed by the parent instead of
//! terminating it: the terminal delivers the signal to the child as well,
//! and the parent must outlive the child to hand its gate unit back.

use async_trait::async_trait;
use std::convert::TryFrom;
use std::time::{Duration, Instant};
use taskmgr_errors::PlatformError;
use tokio::process::Command;
use tracing::{debug, info};

use crate::process::{CommandStatus, PlatformCommand, ProcessOperations};

/// Unix implementation of process operations
pub struct UnixProcessOperations;

impl UnixProcessOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixProcessOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ProcessOperations for UnixProcessOperations {
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandStatus, PlatformError> {
        let start = Instant::now();

        let mut command = Command::new(cmd.program());
        command.args(cmd.get_args());

        debug!(command = cmd.display(), program = cmd.program(), "spawning command");

        let mut child = command
            .spawn()
            .map_err(|e| PlatformError::CommandLaunchFailed {
                command: cmd.display().to_string(),
                message: e.to_string(),
            })?;

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        debug!(error = %e, "cannot listen for interrupts");
                        break child.wait().await;
                    }
                    info!(command = cmd.display(), "interrupt received, waiting for command to exit");
                }
            }
        }
        .map_err(|e| PlatformError::CommandWaitFailed {
            command: cmd.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(
            command = cmd.display(),
            exit_code = ?status.code(),
            duration_ms = duration_to_millis(start.elapsed()),
            "command finished"
        );

        Ok(CommandStatus { status })
    }
}
