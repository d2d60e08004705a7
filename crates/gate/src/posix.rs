//! Kernel named semaphore backend

use std::ffi::CString;
use std::ptr::NonNull;
use std::sync::Arc;

use taskmgr_errors::{GateAction, GateError};
use taskmgr_types::{GateName, StoreBackend};
use tracing::debug;

use crate::{check_capacity, check_name, GateHandle, GateStore};

/// Permission bits for newly created semaphores, before umask
const SEM_MODE: libc::c_uint = 0o666;

/// Gates stored as POSIX named semaphores
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixGateStore;

impl PosixGateStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn c_name(name: &GateName, action: GateAction) -> Result<CString, GateError> {
    check_name(name, action)?;
    CString::new(name.as_str()).map_err(|_| {
        GateError::new(
            action,
            name.as_str(),
            "gate name contains a NUL byte",
            Some(libc::EINVAL),
        )
    })
}

impl GateStore for PosixGateStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Posix
    }

    fn create(&self, name: &GateName, initial: u32) -> Result<(), GateError> {
        check_capacity(name, initial)?;
        let c_name = c_name(name, GateAction::Create)?;

        // SAFETY: c_name is a valid NUL-terminated string; with O_CREAT
        // sem_open takes a mode and an initial value, both passed as c_uint.
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT,
                SEM_MODE,
                initial,
            )
        };
        let sem = checked(sem)
            .ok_or_else(|| GateError::last_os_error(GateAction::Create, name.as_str()))?;

        debug!(gate = %name, initial, "sem_open(O_CREAT) succeeded");

        // Closing right away; the semaphore itself persists until unlinked
        drop(PosixGate {
            name: name.clone(),
            sem,
        });
        Ok(())
    }

    fn open(&self, name: &GateName) -> Result<Arc<dyn GateHandle>, GateError> {
        let c_name = c_name(name, GateAction::Open)?;

        // SAFETY: c_name is a valid NUL-terminated string; without O_CREAT
        // no variadic arguments are read.
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), libc::O_RDWR) };
        let sem = checked(sem)
            .ok_or_else(|| GateError::last_os_error(GateAction::Open, name.as_str()))?;

        debug!(gate = %name, "sem_open succeeded");
        Ok(Arc::new(PosixGate {
            name: name.clone(),
            sem,
        }))
    }

    fn unlink(&self, name: &GateName) -> Result<(), GateError> {
        let c_name = c_name(name, GateAction::Unlink)?;

        // SAFETY: c_name is a valid NUL-terminated string.
        let result = unsafe { libc::sem_unlink(c_name.as_ptr()) };
        if result != 0 {
            return Err(GateError::last_os_error(GateAction::Unlink, name.as_str()));
        }

        debug!(gate = %name, "sem_unlink succeeded");
        Ok(())
    }
}

/// An open named semaphore, closed with `sem_close` on drop
struct PosixGate {
    name: GateName,
    sem: NonNull<libc::sem_t>,
}

// SAFETY: POSIX semaphore operations are thread-safe and the pointer stays
// valid until sem_close, which only runs in Drop.
unsafe impl Send for PosixGate {}
unsafe impl Sync for PosixGate {}

/// `None` when sem_open reported failure (`SEM_FAILED` is NULL on Linux, -1 on macOS)
fn checked(sem: *mut libc::sem_t) -> Option<NonNull<libc::sem_t>> {
    NonNull::new(sem).filter(|ptr| ptr.as_ptr() != libc::SEM_FAILED)
}

impl GateHandle for PosixGate {
    fn name(&self) -> &GateName {
        &self.name
    }

    fn post(&self) -> Result<(), GateError> {
        // SAFETY: self.sem is an open semaphore.
        if unsafe { libc::sem_post(self.sem.as_ptr()) } != 0 {
            return Err(GateError::last_os_error(GateAction::Post, self.name.as_str()));
        }
        Ok(())
    }

    fn wait(&self) -> Result<(), GateError> {
        loop {
            // SAFETY: self.sem is an open semaphore.
            if unsafe { libc::sem_wait(self.sem.as_ptr()) } == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(GateError::from_io(GateAction::Wait, self.name.as_str(), &err));
            }
            debug!(gate = %self.name, "sem_wait interrupted, retrying");
        }
    }

    fn value(&self) -> Result<i64, GateError> {
        let mut value: libc::c_int = 0;
        // SAFETY: self.sem is an open semaphore and value outlives the call.
        if unsafe { libc::sem_getvalue(self.sem.as_ptr(), &mut value) } != 0 {
            return Err(GateError::last_os_error(
                GateAction::GetValue,
                self.name.as_str(),
            ));
        }
        Ok(i64::from(value))
    }
}

impl Drop for PosixGate {
    fn drop(&mut self) {
        // SAFETY: self.sem came from a successful sem_open and is closed once.
        if unsafe { libc::sem_close(self.sem.as_ptr()) } != 0 {
            debug!(
                gate = %self.name,
                error = %std::io::Error::last_os_error(),
                "sem_close failed"
            );
        }
    }
}
