//! Output rendering

use std::io::{self, Write};

use taskmgr_ops::OperationResult;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render operation result to stdout
    pub fn render_result(self, result: &OperationResult) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_result(&mut out, result)?;
        out.flush()
    }

    fn write_result(self, out: &mut impl Write, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            return writeln!(out, "{json}");
        }

        match result {
            OperationResult::Status { gate, capacity } => {
                writeln!(out, "sem {gate} has {capacity} resources")
            }
            // Other modes are silent on success.
            OperationResult::Created { .. }
            | OperationResult::Adjusted { .. }
            | OperationResult::Ran(_)
            | OperationResult::Destroyed { .. } => Ok(()),
        }
    }
}
