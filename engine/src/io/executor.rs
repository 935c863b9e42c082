//! Script-to-command composition.
//!
//! Scripts always run through `/bin/bash -c` with `set -e` prepended, so the
//! first failing statement aborts the script with its exit code.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::core::secrets::Secrets;
use crate::io::runner::{Runner, RunnerInput, RunnerOutput};

/// Run a shell script in `work_dir` with exactly the given environment.
pub fn run_script(
    runner: &dyn Runner,
    work_dir: &Path,
    script: &str,
    env: BTreeMap<String, String>,
    secrets: &Secrets,
    timeout: Duration,
) -> Result<RunnerOutput> {
    debug!(work_dir = %work_dir.display(), script, "running script");
    let input = RunnerInput {
        cmd: "/bin/bash".to_string(),
        args: vec!["-c".to_string(), format!("set -e\n{script}")],
        env,
        work_dir: work_dir.to_path_buf(),
    };
    let output = runner.execute(&input, secrets, timeout)?;
    debug!(exit_code = output.exit_code, "script finished");
    Ok(output)
}
