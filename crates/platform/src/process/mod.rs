//! Process execution operations

use async_trait::async_trait;
use std::process::ExitStatus;
use taskmgr_errors::PlatformError;

/// Shell used for command lines, as `system(3)` does
pub const SHELL: &str = "/bin/sh";

/// Platform-specific command builder and execution
#[derive(Debug, Clone)]
pub struct PlatformCommand {
    program: String,
    args: Vec<String>,
    /// Text used in diagnostics; the raw line for shell commands
    display: String,
}

impl PlatformCommand {
    /// Create a new platform command
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            display: program.to_string(),
        }
    }

    /// `sh -c <line>`
    #[must_use]
    pub fn shell(line: &str) -> Self {
        let mut cmd = Self::new(SHELL);
        cmd.arg("-c").arg(line);
        cmd.display = line.to_string();
        cmd
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<str>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Get the program name
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the arguments
    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Command text for diagnostics
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// How a finished command ended
#[derive(Debug, Clone, Copy)]
pub struct CommandStatus {
    pub status: ExitStatus,
}

impl CommandStatus {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when the command was killed by a signal
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Trait for process execution operations
#[async_trait]
pub trait ProcessOperations: Send + Sync {
    /// Run a command to completion with inherited stdio
    ///
    /// A non-zero exit status is not an error; only failing to start or
    /// to wait for the child is.
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandStatus, PlatformError>;
}
