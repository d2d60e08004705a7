//! Platform abstraction layer for running external commands.
//!
//! The gate operations only need one platform capability: run a shell
//! command line to completion the way `system(3)` does, with the child
//! inheriting the terminal and the parent surviving an interactive
//! interrupt long enough to clean up.

pub mod core;
pub mod implementations;
pub mod process;

pub use self::core::Platform;
pub use implementations::unix::UnixProcessOperations;

/// Re-export commonly used types
pub use process::{CommandStatus, PlatformCommand, ProcessOperations, SHELL};
