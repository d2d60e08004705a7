//! Gate identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate used when no name is given on the command line or in config
pub const DEFAULT_GATE_NAME: &str = "/taskmgr-default";

/// Longest accepted name, excluding the leading slash.
///
/// glibc stores named semaphores as `/dev/shm/sem.<name>`, so the usable
/// length is `NAME_MAX` minus the `sem.` prefix.
pub const MAX_GATE_NAME_LEN: usize = 251;

/// Why a gate name cannot be handed to a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    Empty,
    InteriorSlash,
    InteriorNul,
    TooLong,
}

impl fmt::Display for NameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "gate name is empty",
            Self::InteriorSlash => "gate name may only contain a leading '/'",
            Self::InteriorNul => "gate name contains a NUL byte",
            Self::TooLong => "gate name is too long",
        })
    }
}

/// Name of a shared gate in the store namespace.
///
/// Names are kept in the POSIX form with a single leading slash, so
/// `jobs` and `/jobs` address the same gate. Construction never fails;
/// stores call [`GateName::validate`] and report violations as failures
/// of the action they were asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateName(String);

impl GateName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('/') {
            Self(name)
        } else {
            Self(format!("/{name}"))
        }
    }

    /// POSIX form, e.g. `/jobs`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the leading slash, e.g. `jobs`
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.0[1..]
    }

    /// Check that the name is usable as a store key
    ///
    /// # Errors
    ///
    /// Returns the first [`NameViolation`] found.
    pub fn validate(&self) -> Result<(), NameViolation> {
        let stem = self.stem();
        if stem.is_empty() {
            return Err(NameViolation::Empty);
        }
        if stem.contains('\0') {
            return Err(NameViolation::InteriorNul);
        }
        if stem.contains('/') {
            return Err(NameViolation::InteriorSlash);
        }
        if stem.len() > MAX_GATE_NAME_LEN {
            return Err(NameViolation::TooLong);
        }
        Ok(())
    }
}

impl Default for GateName {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_NAME)
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GateName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GateName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for GateName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
