//! Admission control operations on a single gate

// Every operation keeps the async signature `execute` dispatches on.
#![allow(clippy::unused_async)]

use std::sync::Arc;
use std::time::Instant;

use taskmgr_errors::{Error, GateAction, GateError, OpsError};
use taskmgr_gate::{acquire_gate_permit, GateHandle};
use taskmgr_types::{Capacity, GateName, OperationRequest};
use tracing::{debug, info, warn};

use crate::types::{AdjustDirection, CommandOutcome, RunReport};
use crate::{OperationResult, OpsCtx};

/// Create a gate with `initial` units, keeping an existing gate untouched
///
/// # Errors
///
/// Returns a create failure if `initial` is negative or too large, or if
/// the store refuses creation.
pub async fn create(
    ctx: &OpsCtx,
    gate: &GateName,
    initial: Capacity,
) -> Result<OperationResult, Error> {
    let units = u32::try_from(initial).map_err(|_| {
        GateError::new(
            GateAction::Create,
            gate.as_str(),
            format!("invalid initial capacity {initial}"),
            None,
        )
    })?;

    ctx.store.create(gate, units)?;
    info!(gate = %gate, initial, backend = %ctx.store.backend(), "gate ready");

    Ok(OperationResult::Created {
        gate: gate.clone(),
        initial,
    })
}

/// Change the capacity of an existing gate by `delta` units
///
/// A non-negative delta grows the gate, one post per unit. A negative delta
/// shrinks it by taking units and never giving them back: every unit waits
/// until it is available, so this blocks while holders keep the gate at
/// zero.
///
/// # Errors
///
/// Returns an open failure if the gate does not exist, and the first post
/// or wait failure otherwise. Units applied before a failure stay applied.
pub async fn adjust_capacity(
    ctx: &OpsCtx,
    gate: &GateName,
    delta: Capacity,
) -> Result<OperationResult, Error> {
    let handle = ctx.store.open(gate)?;
    let (direction, units) = AdjustDirection::split(delta);

    match direction {
        AdjustDirection::Grow => grow(handle.as_ref(), units)?,
        AdjustDirection::Shrink => shrink(handle, units).await?,
    }

    info!(gate = %gate, delta, "gate capacity adjusted");
    Ok(OperationResult::Adjusted {
        gate: gate.clone(),
        direction,
        units,
    })
}

/// Post `units` times; never blocks
///
/// # Errors
///
/// Returns the first post failure.
pub fn grow(handle: &dyn GateHandle, units: u64) -> Result<(), GateError> {
    for applied in 0..units {
        if let Err(e) = handle.post() {
            debug!(gate = %handle.name(), applied, requested = units, "grow stopped early");
            return Err(e);
        }
    }
    Ok(())
}

/// Wait `units` times on the blocking pool, holding every unit taken
///
/// # Errors
///
/// Returns the first wait failure, or [`OpsError::TaskFailed`] if the
/// blocking task panicked.
pub async fn shrink(handle: Arc<dyn GateHandle>, units: u64) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || -> Result<(), GateError> {
        for applied in 0..units {
            if let Err(e) = handle.wait() {
                debug!(gate = %handle.name(), applied, requested = units, "shrink stopped early");
                return Err(e);
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| OpsError::TaskFailed {
        message: format!("shrink task failed: {e}"),
    })?
    .map_err(Error::from)
}

/// Acquire one unit, run the first command, release the unit
///
/// The unit is given back whatever the command does. A command that cannot
/// be launched or exits non-zero is reported in the result, not as an error.
///
/// # Errors
///
/// Returns an open failure if the gate does not exist, a wait failure if no
/// unit could be taken and a post failure if the unit could not be given
/// back.
pub async fn run(ctx: &OpsCtx, request: &OperationRequest) -> Result<OperationResult, Error> {
    let gate = &request.gate;
    let handle = ctx.store.open(gate)?;

    let ignored_commands = request.commands.len().saturating_sub(1);
    if ignored_commands > 0 {
        warn!(gate = %gate, ignored_commands, "only the first command is executed");
    }
    if request.fork_times != 1 {
        debug!(gate = %gate, fork_times = request.fork_times, "fork count is not acted upon");
    }

    let permit = acquire_gate_permit(handle).await?;
    let held = Instant::now();

    let outcome = match request.first_command() {
        Some(line) => match ctx.platform.run_shell(line).await {
            Ok(status) => {
                if !status.success() {
                    info!(gate = %gate, command = line, code = ?status.code(), "command exited unsuccessfully");
                }
                CommandOutcome::Exited {
                    command: line.to_string(),
                    code: status.code(),
                }
            }
            Err(e) => {
                warn!(gate = %gate, "{e}");
                CommandOutcome::LaunchFailed {
                    command: line.to_string(),
                    message: e.to_string(),
                }
            }
        },
        None => CommandOutcome::Skipped,
    };

    permit.release()?;

    let held_ms = u64::try_from(held.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(gate = %gate, held_ms, "gate unit released");

    Ok(OperationResult::Ran(RunReport {
        gate: gate.clone(),
        outcome,
        ignored_commands,
        held_ms,
    }))
}

/// Report the number of units currently available; never blocks
///
/// # Errors
///
/// Returns an open failure if the gate does not exist and a get-value
/// failure if the counter cannot be read.
pub async fn status(ctx: &OpsCtx, gate: &GateName) -> Result<OperationResult, Error> {
    let handle = ctx.store.open(gate)?;
    let capacity = handle.value()?;
    debug!(gate = %gate, capacity, "gate status");

    Ok(OperationResult::Status {
        gate: gate.clone(),
        capacity,
    })
}

/// Remove a gate from the store namespace
///
/// # Errors
///
/// Returns an unlink failure, including when the gate does not exist.
pub async fn destroy(ctx: &OpsCtx, gate: &GateName) -> Result<OperationResult, Error> {
    ctx.store.unlink(gate)?;
    info!(gate = %gate, "gate destroyed");

    Ok(OperationResult::Destroyed { gate: gate.clone() })
}
