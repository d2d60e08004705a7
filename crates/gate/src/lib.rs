#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Gate store backends for taskmgr
//!
//! A gate is a named counter shared by every process on the host. This crate
//! exposes it through two traits: [`GateStore`] operates on names (create,
//! open, unlink) and [`GateHandle`] operates on an opened gate (post, wait,
//! value). Two backends are provided:
//!
//! - [`PosixGateStore`]: kernel named semaphores via `sem_open(3)`
//! - [`FileGateStore`]: one counter file per gate, serialized with `flock(2)`
//!
//! Handles are closed when dropped. [`GatePermit`] ties one acquired unit to
//! a scope and gives it back when the scope ends.

pub mod file;
pub mod permit;
pub mod posix;

pub use file::FileGateStore;
pub use permit::{acquire_gate_permit, GatePermit};
pub use posix::PosixGateStore;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskmgr_errors::{GateAction, GateError};
use taskmgr_types::{GateName, NameViolation, StoreBackend};

/// Largest capacity a gate can be created with (`SEM_VALUE_MAX` on Linux)
pub const MAX_CAPACITY: u32 = i32::MAX.unsigned_abs();

/// Name-level operations on a gate namespace
pub trait GateStore: Send + Sync {
    /// Which facility this store uses
    fn backend(&self) -> StoreBackend;

    /// Create the gate with `initial` units, or leave an existing gate as is
    ///
    /// # Errors
    ///
    /// Returns [`GateError::CreateFailed`] if the name is invalid, the
    /// capacity is out of range or the host facility refuses creation.
    fn create(&self, name: &GateName, initial: u32) -> Result<(), GateError>;

    /// Open an existing gate
    ///
    /// # Errors
    ///
    /// Returns [`GateError::OpenFailed`] if the gate does not exist or
    /// cannot be opened.
    fn open(&self, name: &GateName) -> Result<Arc<dyn GateHandle>, GateError>;

    /// Remove the gate from the namespace
    ///
    /// Handles other processes still hold keep working on the removed gate.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnlinkFailed`] if the gate does not exist.
    fn unlink(&self, name: &GateName) -> Result<(), GateError>;
}

/// An opened gate, closed on drop
pub trait GateHandle: Send + Sync {
    fn name(&self) -> &GateName;

    /// Add one unit; never blocks
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PostFailed`], e.g. when the counter would overflow.
    fn post(&self) -> Result<(), GateError>;

    /// Take one unit, blocking until one is available
    ///
    /// # Errors
    ///
    /// Returns [`GateError::WaitFailed`] if the underlying wait fails.
    fn wait(&self) -> Result<(), GateError>;

    /// Current number of available units; a snapshot, never blocks
    ///
    /// # Errors
    ///
    /// Returns [`GateError::GetValueFailed`] if the value cannot be read.
    fn value(&self) -> Result<i64, GateError>;
}

/// Build the store selected by `backend`
///
/// `file_dir` and `poll_interval` only matter for [`StoreBackend::File`].
#[must_use]
pub fn open_store(
    backend: StoreBackend,
    file_dir: PathBuf,
    poll_interval: Duration,
) -> Arc<dyn GateStore> {
    match backend {
        StoreBackend::Posix => Arc::new(PosixGateStore::new()),
        StoreBackend::File => Arc::new(FileGateStore::new(file_dir, poll_interval)),
    }
}

/// Reject names the store cannot represent, as a failure of `action`
pub(crate) fn check_name(name: &GateName, action: GateAction) -> Result<(), GateError> {
    name.validate().map_err(|violation| {
        let code = match violation {
            NameViolation::TooLong => libc::ENAMETOOLONG,
            NameViolation::Empty | NameViolation::InteriorSlash | NameViolation::InteriorNul => {
                libc::EINVAL
            }
        };
        GateError::new(action, name.as_str(), violation.to_string(), Some(code))
    })
}

pub(crate) fn check_capacity(name: &GateName, initial: u32) -> Result<(), GateError> {
    if initial > MAX_CAPACITY {
        return Err(GateError::new(
            GateAction::Create,
            name.as_str(),
            format!("capacity {initial} exceeds maximum {MAX_CAPACITY}"),
            Some(libc::EINVAL),
        ));
    }
    Ok(())
}
