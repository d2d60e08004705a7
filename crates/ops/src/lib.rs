#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Admission control for taskmgr gates
//!
//! This crate sits between the command line front end and the gate store.
//! Each operation opens what it needs from the store, acts, and closes its
//! handle before returning.

mod context;
mod gate_ops;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use gate_ops::{adjust_capacity, create, destroy, grow, run, shrink, status};
pub use types::{AdjustDirection, CommandOutcome, RunReport};

use serde::Serialize;
use taskmgr_errors::{Error, OpsError};
use taskmgr_types::{Capacity, GateName, OperationKind, OperationRequest};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Gate exists (newly created or already present)
    Created { gate: GateName, initial: Capacity },
    /// Capacity changed by `units` in `direction`
    Adjusted {
        gate: GateName,
        direction: AdjustDirection,
        units: u64,
    },
    /// A unit was held while the command ran
    Ran(RunReport),
    /// Snapshot of available units
    Status { gate: GateName, capacity: i64 },
    /// Gate removed
    Destroyed { gate: GateName },
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Gate the operation acted on
    #[must_use]
    pub fn gate(&self) -> &GateName {
        match self {
            Self::Created { gate, .. }
            | Self::Adjusted { gate, .. }
            | Self::Status { gate, .. }
            | Self::Destroyed { gate } => gate,
            Self::Ran(report) => &report.gate,
        }
    }
}

/// Dispatch a resolved request to its operation
///
/// # Errors
///
/// Returns whatever error the selected operation returns.
pub async fn execute(ctx: &OpsCtx, request: &OperationRequest) -> Result<OperationResult, Error> {
    match request.kind {
        OperationKind::Create => create(ctx, &request.gate, request.value).await,
        OperationKind::Adjust => adjust_capacity(ctx, &request.gate, request.value).await,
        OperationKind::Run => run(ctx, request).await,
        OperationKind::Status => status(ctx, &request.gate).await,
        OperationKind::Destroy => destroy(ctx, &request.gate).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_tag() {
        let result = OperationResult::Status {
            gate: GateName::new("ci"),
            capacity: 3,
        };
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "Status");
        assert_eq!(json["data"]["gate"], "/ci");
        assert_eq!(json["data"]["capacity"], 3);
    }

    #[test]
    fn run_outcome_is_tagged_by_status() {
        let result = OperationResult::Ran(RunReport {
            gate: GateName::new("ci"),
            outcome: CommandOutcome::LaunchFailed {
                command: "make".into(),
                message: "no shell".into(),
            },
            ignored_commands: 1,
            held_ms: 0,
        });
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["outcome"]["status"], "launch_failed");
        assert_eq!(json["data"]["ignored_commands"], 1);
        assert_eq!(result.gate().as_str(), "/ci");
    }

    #[test]
    fn delta_splits_by_sign() {
        assert_eq!(AdjustDirection::split(0), (AdjustDirection::Grow, 0));
        assert_eq!(AdjustDirection::split(4), (AdjustDirection::Grow, 4));
        assert_eq!(AdjustDirection::split(-2), (AdjustDirection::Shrink, 2));
        assert_eq!(
            AdjustDirection::split(i64::MIN),
            (AdjustDirection::Shrink, 1u64 << 63)
        );
    }
}
