//! File-backed gate emulation
//!
//! Each gate is a small file holding the decimal counter. Every
//! read-modify-write of the counter happens under an exclusive `flock(2)`
//! on that file, which gives the same per-unit atomicity as a semaphore.
//! Waiting on an exhausted gate polls: the lock is dropped between checks so
//! other participants can post.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use taskmgr_errors::{GateAction, GateError};
use taskmgr_types::{GateName, StoreBackend};
use tracing::debug;

use crate::{check_capacity, check_name, GateHandle, GateStore, MAX_CAPACITY};

const GATE_FILE_EXTENSION: &str = "gate";

/// Longest counter text we ever write (`i64::MIN` is 20 bytes)
const MAX_COUNTER_LEN: usize = 32;

/// Gates stored as lock-protected counter files in one directory
#[derive(Debug, Clone)]
pub struct FileGateStore {
    dir: PathBuf,
    poll_interval: Duration,
}

impl FileGateStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            poll_interval,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Counter file for `name`, e.g. `<dir>/jobs.gate`
    #[must_use]
    pub fn path_for(&self, name: &GateName) -> PathBuf {
        self.dir
            .join(format!("{}.{GATE_FILE_EXTENSION}", name.stem()))
    }

    /// Write `initial` to a private file and hard-link it into place.
    ///
    /// `link(2)` refuses to replace an existing file, so concurrent creators
    /// race safely and nobody ever observes a half-written counter.
    fn publish(&self, name: &GateName, initial: u32) -> io::Result<bool> {
        fs::create_dir_all(&self.dir)?;

        let target = self.path_for(name);
        let staging = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            name.stem(),
            std::process::id(),
            unique_suffix()
        ));

        let result = (|| -> io::Result<bool> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staging)?;
            file.write_all(initial.to_string().as_bytes())?;
            file.sync_all()?;
            match fs::hard_link(&staging, &target) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
                Err(e) => Err(e),
            }
        })();

        let _ = fs::remove_file(&staging);
        result
    }
}

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
}

impl GateStore for FileGateStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::File
    }

    fn create(&self, name: &GateName, initial: u32) -> Result<(), GateError> {
        check_name(name, GateAction::Create)?;
        check_capacity(name, initial)?;

        let created = self
            .publish(name, initial)
            .map_err(|e| GateError::from_io(GateAction::Create, name.as_str(), &e))?;

        if created {
            debug!(gate = %name, initial, path = %self.path_for(name).display(), "created gate file");
        } else {
            debug!(gate = %name, "gate file already exists, leaving it unchanged");
        }
        Ok(())
    }

    fn open(&self, name: &GateName) -> Result<Arc<dyn GateHandle>, GateError> {
        check_name(name, GateAction::Open)?;

        let path = self.path_for(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| GateError::from_io(GateAction::Open, name.as_str(), &e))?;

        debug!(gate = %name, path = %path.display(), "opened gate file");
        Ok(Arc::new(FileGate {
            name: name.clone(),
            file,
            poll_interval: self.poll_interval,
        }))
    }

    fn unlink(&self, name: &GateName) -> Result<(), GateError> {
        check_name(name, GateAction::Unlink)?;

        fs::remove_file(self.path_for(name))
            .map_err(|e| GateError::from_io(GateAction::Unlink, name.as_str(), &e))?;

        debug!(gate = %name, "removed gate file");
        Ok(())
    }
}

/// An open counter file; the descriptor is closed on drop
struct FileGate {
    name: GateName,
    file: File,
    poll_interval: Duration,
}

/// Exclusive `flock` held for the guard's lifetime
struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    fn exclusive(file: &'a File) -> io::Result<Self> {
        loop {
            // SAFETY: the descriptor is owned by `file`, which outlives the lock.
            if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) } == 0 {
                return Ok(Self { file });
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        // SAFETY: see FileLock::exclusive.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

impl FileGate {
    /// Run `f` on the counter while holding the lock, persisting any change
    fn locked<T>(
        &self,
        action: GateAction,
        f: impl FnOnce(&mut i64) -> io::Result<T>,
    ) -> Result<T, GateError> {
        let fail = |e: &io::Error| GateError::from_io(action, self.name.as_str(), e);

        let _lock = FileLock::exclusive(&self.file).map_err(|e| fail(&e))?;
        let mut value = self.read_counter().map_err(|e| fail(&e))?;
        let before = value;
        let out = f(&mut value).map_err(|e| fail(&e))?;
        if value != before {
            self.write_counter(value).map_err(|e| fail(&e))?;
        }
        Ok(out)
    }

    fn read_counter(&self) -> io::Result<i64> {
        let mut buf = [0u8; MAX_COUNTER_LEN];
        let mut len = 0;
        while len < buf.len() {
            let n = self.file.read_at(&mut buf[len..], len as u64)?;
            if n == 0 {
                break;
            }
            len += n;
        }
        std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|text| text.trim().parse().ok())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("gate file for {} is corrupt", self.name),
                )
            })
    }

    /// Overwrite in place, then cut off leftover digits; the file is never empty
    fn write_counter(&self, value: i64) -> io::Result<()> {
        let text = value.to_string();
        self.file.write_all_at(text.as_bytes(), 0)?;
        self.file.set_len(text.len() as u64)
    }
}

impl GateHandle for FileGate {
    fn name(&self) -> &GateName {
        &self.name
    }

    fn post(&self) -> Result<(), GateError> {
        self.locked(GateAction::Post, |value| {
            if *value >= i64::from(MAX_CAPACITY) {
                return Err(io::Error::from_raw_os_error(libc::EOVERFLOW));
            }
            *value += 1;
            Ok(())
        })
    }

    fn wait(&self) -> Result<(), GateError> {
        loop {
            let taken = self.locked(GateAction::Wait, |value| {
                if *value > 0 {
                    *value -= 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            })?;
            if taken {
                return Ok(());
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn value(&self) -> Result<i64, GateError> {
        self.locked(GateAction::GetValue, |value| Ok(*value))
    }
}
