//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout stays reserved for status output.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

const TASKMGR_CRATES: [&str; 5] = [
    "taskmgr",
    "taskmgr_ops",
    "taskmgr_gate",
    "taskmgr_platform",
    "taskmgr_config",
];

/// Filter used when `RUST_LOG` is unset
fn default_directives(level: &str, debug: bool) -> String {
    if debug {
        let mut directives = vec![level.to_string()];
        directives.extend(TASKMGR_CRATES.iter().map(|krate| format!("{krate}=debug")));
        directives.join(",")
    } else {
        level.to_string()
    }
}

/// Install the global subscriber; `RUST_LOG` takes precedence
pub fn init_tracing(level: &str, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level, debug)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(debug)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
