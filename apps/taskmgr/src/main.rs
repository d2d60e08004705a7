//! taskmgr - named cross-process counting gate
//!
//! Creates, resizes, inspects and removes named gates, and runs a shell
//! command while holding one unit of a gate. All work is delegated to the
//! ops crate; this binary resolves the request and maps failures to exit
//! codes.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::Cli;
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use std::process;
use taskmgr_config::Config;
use taskmgr_gate::open_store;
use taskmgr_ops::OpsContextBuilder;
use taskmgr_platform::Platform;
use tracing::{debug, info};

/// Exit status for unusable command lines
const USAGE_EXIT_CODE: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version also arrive here, on stdout.
            let code = if e.use_stderr() { USAGE_EXIT_CODE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(cli).await {
        debug!(code = ?e.code(), hint = ?e.hint(), "operation failed");
        eprintln!("taskmgr: {e}");
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Defaults < file < environment < command line
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(backend) = cli.backend {
        config.gate.backend = backend;
    }

    logging::init_tracing(&config.logging.level, cli.debug);
    debug!(
        backend = %config.gate.backend,
        gate_dir = %config.gate_dir().display(),
        "configuration loaded"
    );

    let verbose = cli.verbose;
    let renderer = OutputRenderer::new(cli.json);
    let request = cli.into_request(config.default_gate());

    if verbose {
        eprintln!("{request}");
        return Ok(());
    }

    let store = open_store(
        config.gate.backend,
        config.gate_dir(),
        config.poll_interval(),
    );
    let ctx = OpsContextBuilder::new()
        .with_store(store)
        .with_platform(Platform::current())
        .build()?;

    let result = taskmgr_ops::execute(&ctx, &request).await?;
    renderer.render_result(&result)?;

    info!(kind = %request.kind, gate = %result.gate(), "command completed");
    Ok(())
}
