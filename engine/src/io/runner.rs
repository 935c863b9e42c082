//! Runner abstraction for script invocation.
//!
//! The [`Runner`] trait decouples the scheduler from actual process spawning.
//! Tests may use scripted runners that return predetermined output; production
//! uses [`SubprocessRunner`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::instrument;

use crate::core::output::parse_streams;
use crate::core::secrets::Secrets;
use crate::core::types::format_timeout;

/// Exit code reported when a script is terminated by the timeout, matching
/// the convention of coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// One command invocation.
#[derive(Debug, Clone)]
pub struct RunnerInput {
    pub cmd: String,
    pub args: Vec<String>,
    /// Environment of the child. Nothing is inherited from the parent; the
    /// runner adds the secret values under their names.
    pub env: BTreeMap<String, String>,
    pub work_dir: PathBuf,
}

/// Classified output of one command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerOutput {
    pub exit_code: i32,
    /// Redacted stdout lines in emission order.
    pub logs: Vec<String>,
    /// Redacted stderr lines, plus a synthesized entry on timeout.
    pub err_logs: Vec<String>,
    /// Structured records parsed from stdout JSON lines.
    pub data: Vec<Value>,
}

/// Abstraction over script execution backends.
pub trait Runner {
    /// Run the command to completion or timeout and classify its output.
    ///
    /// Timeout termination is not an error: it yields exit code 124 and a
    /// synthesized error-log line. Only launch failures are call errors.
    fn execute(
        &self,
        input: &RunnerInput,
        secrets: &Secrets,
        timeout: Duration,
    ) -> Result<RunnerOutput>;
}

/// Runner that spawns real child processes.
#[derive(Debug, Default)]
pub struct SubprocessRunner;

impl Runner for SubprocessRunner {
    #[instrument(skip_all, fields(cmd = %input.cmd, work_dir = %input.work_dir.display()))]
    fn execute(
        &self,
        input: &RunnerInput,
        secrets: &Secrets,
        timeout: Duration,
    ) -> Result<RunnerOutput> {
        let mut cmd = Command::new(&input.cmd);
        cmd.args(&input.args)
            .env_clear()
            .envs(&input.env)
            // Secrets are available to the script by name; they only ever
            // leave the process redacted.
            .envs(secrets.iter())
            .current_dir(&input.work_dir);

        let output = crate::io::process::run_command_with_timeout(cmd, timeout)
            .with_context(|| format!("run '{}'", input.cmd))?;

        let parsed = parse_streams(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            secrets,
        );

        let mut err_logs = parsed.err_logs;
        let exit_code = if output.timed_out {
            err_logs.push(format!(
                "Command timed out after {}",
                format_timeout(timeout)
            ));
            TIMEOUT_EXIT_CODE
        } else {
            // Signal-terminated processes carry no exit code.
            output.status.code().unwrap_or(-1)
        };

        Ok(RunnerOutput {
            exit_code,
            logs: parsed.logs,
            err_logs,
            data: parsed.data,
        })
    }
}
