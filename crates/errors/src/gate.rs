//! Gate store error types

use std::borrow::Cow;
use std::fmt;

use crate::UserFacingError;
use thiserror::Error;

/// The store primitive that was being exercised when a failure happened.
///
/// Each action owns a distinct process exit code so scripts can tell
/// failure categories apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateAction {
    Create,
    Open,
    Post,
    Wait,
    Unlink,
    GetValue,
}

impl GateAction {
    /// Verb used in diagnostics, e.g. `wait on sem /jobs failed: ...`
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Open => "open",
            Self::Post => "increase",
            Self::Wait => "wait on",
            Self::Unlink => "unlink",
            Self::GetValue => "get value of",
        }
    }

    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Create => 3,
            Self::Open => 4,
            Self::Post => 5,
            Self::Wait => 6,
            Self::Unlink | Self::GetValue => 7,
        }
    }
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Failures reported by a gate store backend
#[derive(Debug, Clone, Error)]
pub enum GateError {
    #[error("create sem {name} failed: {message}")]
    CreateFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },

    #[error("open sem {name} failed: {message}")]
    OpenFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },

    #[error("increase sem {name} failed: {message}")]
    PostFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },

    #[error("wait on sem {name} failed: {message}")]
    WaitFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },

    #[error("unlink sem {name} failed: {message}")]
    UnlinkFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },

    #[error("get value of sem {name} failed: {message}")]
    GetValueFailed {
        name: String,
        message: String,
        os_code: Option<i32>,
    },
}

impl GateError {
    /// Build an error for `action` on gate `name` from an OS error
    #[must_use]
    pub fn from_io(action: GateAction, name: impl Into<String>, err: &std::io::Error) -> Self {
        Self::new(action, name, err.to_string(), err.raw_os_error())
    }

    /// Build an error for `action` from the calling thread's `errno`
    #[must_use]
    pub fn last_os_error(action: GateAction, name: impl Into<String>) -> Self {
        Self::from_io(action, name, &std::io::Error::last_os_error())
    }

    #[must_use]
    pub fn new(
        action: GateAction,
        name: impl Into<String>,
        message: impl Into<String>,
        os_code: Option<i32>,
    ) -> Self {
        let name = name.into();
        let message = message.into();
        match action {
            GateAction::Create => Self::CreateFailed {
                name,
                message,
                os_code,
            },
            GateAction::Open => Self::OpenFailed {
                name,
                message,
                os_code,
            },
            GateAction::Post => Self::PostFailed {
                name,
                message,
                os_code,
            },
            GateAction::Wait => Self::WaitFailed {
                name,
                message,
                os_code,
            },
            GateAction::Unlink => Self::UnlinkFailed {
                name,
                message,
                os_code,
            },
            GateAction::GetValue => Self::GetValueFailed {
                name,
                message,
                os_code,
            },
        }
    }

    #[must_use]
    pub fn action(&self) -> GateAction {
        match self {
            Self::CreateFailed { .. } => GateAction::Create,
            Self::OpenFailed { .. } => GateAction::Open,
            Self::PostFailed { .. } => GateAction::Post,
            Self::WaitFailed { .. } => GateAction::Wait,
            Self::UnlinkFailed { .. } => GateAction::Unlink,
            Self::GetValueFailed { .. } => GateAction::GetValue,
        }
    }

    /// Name of the gate the failing action targeted
    #[must_use]
    pub fn gate_name(&self) -> &str {
        match self {
            Self::CreateFailed { name, .. }
            | Self::OpenFailed { name, .. }
            | Self::PostFailed { name, .. }
            | Self::WaitFailed { name, .. }
            | Self::UnlinkFailed { name, .. }
            | Self::GetValueFailed { name, .. } => name,
        }
    }

    #[must_use]
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::CreateFailed { os_code, .. }
            | Self::OpenFailed { os_code, .. }
            | Self::PostFailed { os_code, .. }
            | Self::WaitFailed { os_code, .. }
            | Self::UnlinkFailed { os_code, .. }
            | Self::GetValueFailed { os_code, .. } => *os_code,
        }
    }

    /// True when the gate does not exist in the store namespace
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.os_code().is_some_and(|code| {
            std::io::Error::from_raw_os_error(code).kind() == std::io::ErrorKind::NotFound
        })
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.action().exit_code()
    }
}

impl UserFacingError for GateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        if self.is_not_found() {
            return Some("Create the gate first with `taskmgr -n NAME -c COUNT`.");
        }
        match self.os_code().map(|c| std::io::Error::from_raw_os_error(c).kind()) {
            Some(std::io::ErrorKind::PermissionDenied) => {
                Some("The gate belongs to another user; check its permissions.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self.action() {
            GateAction::Create => "gate.create_failed",
            GateAction::Open => "gate.open_failed",
            GateAction::Post => "gate.post_failed",
            GateAction::Wait => "gate.wait_failed",
            GateAction::Unlink => "gate.unlink_failed",
            GateAction::GetValue => "gate.get_value_failed",
        })
    }
}

