//! Unix platform implementation

pub mod process;

pub use process::UnixProcessOperations;
