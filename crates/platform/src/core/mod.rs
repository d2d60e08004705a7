//! Core platform abstractions

use crate::process::{CommandStatus, PlatformCommand, ProcessOperations};
use taskmgr_errors::PlatformError;

/// Main platform abstraction providing access to platform operations
pub struct Platform {
    process_ops: Box<dyn ProcessOperations>,
}

impl Platform {
    /// Create a new platform instance with the specified implementation
    #[must_use]
    pub fn new(process_ops: Box<dyn ProcessOperations>) -> Self {
        Self { process_ops }
    }

    /// Get the current platform
    #[must_use]
    pub fn current() -> Self {
        use crate::implementations::unix::UnixProcessOperations;

        Self::new(Box::new(UnixProcessOperations::new()))
    }

    /// Access process operations
    #[must_use]
    pub fn process(&self) -> &dyn ProcessOperations {
        &*self.process_ops
    }

    /// Convenience method: Run a command line through the shell
    pub async fn run_shell(&self, line: &str) -> Result<CommandStatus, PlatformError> {
        let cmd = PlatformCommand::shell(line);
        self.process().execute_command(cmd).await
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}
