//! Environment variable names and fixed defaults

pub const ENV_NAME: &str = "TASKMGR_NAME";
pub const ENV_BACKEND: &str = "TASKMGR_BACKEND";
pub const ENV_GATE_DIR: &str = "TASKMGR_GATE_DIR";
pub const ENV_POLL_MS: &str = "TASKMGR_POLL_MS";

/// Directory under the runtime/temp dir holding file-backed gates
pub const GATE_DIR_NAME: &str = "taskmgr";
pub const FALLBACK_GATE_DIR_NAME: &str = "taskmgr-gates";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
