//! Platform-specific operation errors

use thiserror::Error;

/// Errors that can occur while running external commands
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("shell command '''{command}''' execute failed: {message}")]
    CommandLaunchFailed { command: String, message: String },

    #[error("waiting for shell command '''{command}''' failed: {message}")]
    CommandWaitFailed { command: String, message: String },
}
