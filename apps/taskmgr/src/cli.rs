//! Command line interface definition

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use taskmgr_types::{Capacity, GateName, OperationKind, OperationRequest, StoreBackend};

/// taskmgr - throttle commands across processes with a named counting gate
///
/// Without a mode flag, waits for one unit of the gate, runs the first
/// COMMAND through /bin/sh and gives the unit back when it finishes.
#[derive(Parser, Debug)]
#[command(name = "taskmgr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Gate name (default from config, then /taskmgr-default)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Create the gate with VALUE units (an existing gate is kept as is)
    #[arg(
        short = 'c',
        long,
        value_name = "VALUE",
        allow_negative_numbers = true,
        overrides_with_all = ["increase", "delete", "status"]
    )]
    pub create: Option<Capacity>,

    /// Add VALUE units to the gate; a negative VALUE takes units and holds them
    #[arg(
        short = 'i',
        long,
        value_name = "VALUE",
        allow_negative_numbers = true,
        overrides_with_all = ["create", "delete", "status"]
    )]
    pub increase: Option<Capacity>,

    /// Remove the gate
    #[arg(short = 'd', long, overrides_with_all = ["create", "increase", "status"])]
    pub delete: bool,

    /// Print the number of available units
    #[arg(short = 's', long, overrides_with_all = ["create", "increase", "delete"])]
    pub status: bool,

    /// Times to run the command (accepted, not acted upon)
    #[arg(
        short = 'f',
        long = "fork",
        value_name = "TIMES",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub fork_times: i64,

    /// Print what would be done and exit
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Gate store backend
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub backend: Option<StoreBackend>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub debug: bool,

    /// Print result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Command line to run while holding a unit; only the first is executed
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub commands: Vec<String>,
}

impl Cli {
    /// Mode selected by the flags; the last mode flag given wins
    pub fn kind(&self) -> OperationKind {
        if self.create.is_some() {
            OperationKind::Create
        } else if self.increase.is_some() {
            OperationKind::Adjust
        } else if self.delete {
            OperationKind::Destroy
        } else if self.status {
            OperationKind::Status
        } else {
            OperationKind::Run
        }
    }

    /// Resolve the request against the configured default gate
    pub fn into_request(self, default_gate: GateName) -> OperationRequest {
        let kind = self.kind();
        let gate = self.name.map_or(default_gate, GateName::new);
        let value = match kind {
            OperationKind::Create => self.create.unwrap_or(1),
            OperationKind::Adjust => self.increase.unwrap_or(1),
            _ => 1,
        };

        OperationRequest {
            kind,
            gate,
            value,
            commands: self.commands,
            fork_times: self.fork_times,
        }
    }
}
