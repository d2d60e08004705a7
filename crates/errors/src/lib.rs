#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for taskmgr
//!
//! Errors are grouped by domain: the gate store, configuration, command
//! execution and the operations layer. Every error is `Clone` so it can be logged and still
//! returned to the caller.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod gate;
pub mod ops;
pub mod platform;

pub use config::ConfigError;
pub use gate::{GateAction, GateError};
pub use ops::OpsError;
pub use platform::PlatformError;

/// Exit code used when no more specific failure category applies
pub const GENERIC_EXIT_CODE: i32 = 2;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{0}")]
    Gate(#[from] GateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Ops(#[from] OpsError),
}

impl Error {
    /// Process exit code for this failure
    ///
    /// Gate store failures map to one code per store action (3..=7);
    /// everything else falls back to [`GENERIC_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Gate(err) => err.exit_code(),
            _ => GENERIC_EXIT_CODE,
        }
    }
}

/// Result type alias for taskmgr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Gate(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Ops(err) => err.user_message(),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Gate(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Gate(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Ops(err) => err.user_code(),
        }
    }
}
