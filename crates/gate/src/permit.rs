//! Scoped acquisition of gate units
//!
//! A [`GatePermit`] stands for one unit taken from a gate. The unit goes
//! back to the gate exactly once: through [`GatePermit::release`], which
//! reports a failed post to the caller, or through `Drop` on any other exit
//! path (early return, error propagation, panic), which can only log it.

use std::sync::Arc;

use taskmgr_errors::{Error, GateError, OpsError};
use tracing::{debug, warn};

use crate::GateHandle;

/// One unit held on a gate
#[must_use = "dropping a permit releases its unit immediately"]
pub struct GatePermit {
    handle: Option<Arc<dyn GateHandle>>,
}

impl GatePermit {
    /// Block the calling thread until a unit is available and take it
    ///
    /// # Errors
    ///
    /// Returns the gate's wait error; no unit is held in that case.
    pub fn acquire_blocking(handle: Arc<dyn GateHandle>) -> Result<Self, GateError> {
        handle.wait()?;
        debug!(gate = %handle.name(), "acquired gate unit");
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Return the unit to the gate
    ///
    /// # Errors
    ///
    /// Returns the gate's post error. The unit is considered spent either
    /// way; `Drop` will not try again.
    pub fn release(mut self) -> Result<(), GateError> {
        match self.handle.take() {
            Some(handle) => {
                handle.post()?;
                debug!(gate = %handle.name(), "released gate unit");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            match handle.post() {
                Ok(()) => debug!(gate = %handle.name(), "released gate unit on drop"),
                Err(e) => warn!(gate = %handle.name(), error = %e, "failed to release gate unit"),
            }
        }
    }
}

/// Acquire a unit without blocking the async runtime
///
/// The wait runs on the blocking thread pool. The permit is built on that
/// thread, so if the returned future is dropped mid-wait the unit is still
/// given back once the wait completes.
///
/// # Errors
///
/// Returns the gate's wait error, or [`OpsError::TaskFailed`] if the
/// blocking task panicked.
pub async fn acquire_gate_permit(handle: Arc<dyn GateHandle>) -> Result<GatePermit, Error> {
    tokio::task::spawn_blocking(move || GatePermit::acquire_blocking(handle))
        .await
        .map_err(|e| OpsError::TaskFailed {
            message: format!("gate wait task failed: {e}"),
        })?
        .map_err(Error::from)
}
