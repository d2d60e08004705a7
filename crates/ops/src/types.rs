//! Types for operation results

use serde::{Deserialize, Serialize};
use taskmgr_types::{Capacity, GateName};

/// Direction of a capacity adjustment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustDirection {
    Grow,
    Shrink,
}

impl AdjustDirection {
    /// Split a signed delta into a direction and a unit count
    #[must_use]
    pub fn split(delta: Capacity) -> (Self, u64) {
        if delta >= 0 {
            (Self::Grow, delta.unsigned_abs())
        } else {
            (Self::Shrink, delta.unsigned_abs())
        }
    }
}

/// What happened to the command while a unit was held
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// No command was given; the unit was taken and given back
    Skipped,
    /// The command ran to completion; `code` is `None` when killed by a signal
    Exited { command: String, code: Option<i32> },
    /// The shell could not be started
    LaunchFailed { command: String, message: String },
}

/// Report of an acquire, execute, release cycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub gate: GateName,
    pub outcome: CommandOutcome,
    /// Commands after the first, which are never executed
    pub ignored_commands: usize,
    /// Wall time the unit was held, in milliseconds
    pub held_ms: u64,
}
