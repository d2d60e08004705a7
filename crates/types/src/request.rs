//! Resolved operation requests

use crate::{Capacity, GateName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a single invocation does to its gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Open-or-create the gate with an initial capacity
    Create,
    /// Grow (positive value) or shrink (negative value) capacity
    Adjust,
    /// Acquire one unit, run the first command, release the unit
    Run,
    /// Report current capacity
    Status,
    /// Remove the gate from the store namespace
    Destroy,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Adjust => "adjust",
            Self::Run => "run",
            Self::Status => "status",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved invocation, produced by the command line front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub gate: GateName,
    /// Initial capacity for `Create`, delta for `Adjust`, unused otherwise
    pub value: Capacity,
    /// Shell command lines; only the first one is ever executed
    pub commands: Vec<String>,
    /// Requested repeat count for `Run`; accepted but not acted upon
    pub fork_times: i64,
}

impl OperationRequest {
    #[must_use]
    pub fn new(kind: OperationKind, gate: GateName) -> Self {
        Self {
            kind,
            gate,
            value: 1,
            commands: Vec::new(),
            fork_times: 1,
        }
    }

    #[must_use]
    pub fn create(gate: GateName, initial: Capacity) -> Self {
        Self {
            value: initial,
            ..Self::new(OperationKind::Create, gate)
        }
    }

    #[must_use]
    pub fn adjust(gate: GateName, delta: Capacity) -> Self {
        Self {
            value: delta,
            ..Self::new(OperationKind::Adjust, gate)
        }
    }

    #[must_use]
    pub fn run(gate: GateName, commands: Vec<String>) -> Self {
        Self {
            commands,
            ..Self::new(OperationKind::Run, gate)
        }
    }

    #[must_use]
    pub fn status(gate: GateName) -> Self {
        Self::new(OperationKind::Status, gate)
    }

    #[must_use]
    pub fn destroy(gate: GateName) -> Self {
        Self::new(OperationKind::Destroy, gate)
    }

    /// The command `Run` will execute, if any
    #[must_use]
    pub fn first_command(&self) -> Option<&str> {
        self.commands.first().map(String::as_str)
    }
}

/// Human readable description printed by `--verbose`
impl fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Create => {
                write!(f, "Create taskmgr {} value = {}", self.gate, self.value)
            }
            OperationKind::Run => {
                write!(
                    f,
                    "Run on taskmgr {}: {} commands each {} times",
                    self.gate,
                    self.commands.len(),
                    self.fork_times
                )?;
                for command in &self.commands {
                    write!(f, "\n\tCommand '''{command}'''")?;
                }
                Ok(())
            }
            OperationKind::Destroy => write!(f, "Delete taskmgr {}", self.gate),
            OperationKind::Adjust => write!(
                f,
                "Increase resources of taskmgr {} by {}",
                self.gate, self.value
            ),
            OperationKind::Status => write!(f, "Show status of taskmgr {}", self.gate),
        }
    }
}
