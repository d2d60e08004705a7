//! CLI error handling

use std::fmt;

use taskmgr_errors::{UserFacingError, GENERIC_EXIT_CODE};

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration or gate operation error
    Ops(taskmgr_errors::Error),
    /// I/O error while writing output
    Io(std::io::Error),
}

impl CliError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Ops(e) => e.exit_code(),
            CliError::Io(_) => GENERIC_EXIT_CODE,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            CliError::Ops(e) => e.user_code(),
            CliError::Io(_) => Some("error.io"),
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Ops(e) => e.user_hint(),
            CliError::Io(_) => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Ops(e) => write!(f, "{}", e.user_message()),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<taskmgr_errors::Error> for CliError {
    fn from(e: taskmgr_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
