#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for taskmgr
//!
//! Shared vocabulary between the CLI front end, the operations layer and the
//! gate store backends: gate identities, resolved operation requests and the
//! backend selector.

pub mod gate;
pub mod request;

pub use gate::{GateName, NameViolation, DEFAULT_GATE_NAME, MAX_GATE_NAME_LEN};
pub use request::{OperationKind, OperationRequest};

use serde::{Deserialize, Serialize};

/// Signed count of available resource units in a gate
pub type Capacity = i64;

/// Which host facility backs the gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Kernel named semaphores (`sem_open` and friends)
    Posix,
    /// Counter files guarded by an advisory lock
    File,
}

impl StoreBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::File => "file",
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posix" | "sem" => Ok(Self::Posix),
            "file" => Ok(Self::File),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for StoreBackend {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Posix, Self::File]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Posix => clap::builder::PossibleValue::new("posix"),
            Self::File => clap::builder::PossibleValue::new("file"),
        })
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Posix
    }
}
