//! Command Execution Gateway
//!
//! Single narrow seam for invoking external hardware tooling (nvme-cli,
//! findmnt, the benchmark engine). Everything above talks to a
//! [`CommandRunner`] so tests never touch real hardware commands.

use crate::{QualError, QualResult};
use std::process::Command;

/// Captured result of one external command invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// stdout and stderr concatenated, for marker scans that must not care
    /// which stream a tool printed to
    pub fn combined(&self) -> String {
        let mut s = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }
}

/// Blocking command invocation with full output capture.
///
/// A non-zero exit status is a data point for the caller, not an error;
/// `run` fails only when the process cannot be spawned at all.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> QualResult<CommandOutput>;
}

/// Production runner over `std::process::Command`
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> QualResult<CommandOutput> {
        tracing::debug!(program, ?args, "executing external command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| QualError::CommandFailed {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}
