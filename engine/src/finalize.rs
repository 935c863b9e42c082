//! Post-processing script execution.
//!
//! Finalize runs once after all checks, directly in the shared root working
//! directory rather than an isolated step tree. It is infrastructure cleanup
//! and reporting, not a graded check: the result carries raw exit code and
//! logs with no verdict semantics.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::instrument;

use crate::core::env::merge_env;
use crate::core::secrets::Secrets;
use crate::core::types::FinalizeResult;
use crate::io::executor::run_script;
use crate::io::runner::Runner;
use crate::io::workdir;

/// The finalize script definition.
#[derive(Debug, Clone, Default)]
pub struct Finalize {
    pub run: String,
    pub env: BTreeMap<String, String>,
    pub configs: BTreeMap<String, String>,
}

impl Finalize {
    /// Run the finalize script in the root working directory.
    ///
    /// Declared config files are force-created, overwriting whatever the
    /// checks left behind.
    #[instrument(skip_all, fields(root = %root_work_dir.display()))]
    pub fn execute(
        &self,
        root_work_dir: &Path,
        env: &BTreeMap<String, String>,
        secrets: &Secrets,
        timeout: Duration,
        runner: &dyn Runner,
    ) -> Result<FinalizeResult> {
        self.overwrite_config_files(root_work_dir)
            .context("failed to create config files")?;

        let reserved = BTreeMap::from([(
            "result_path".to_string(),
            root_work_dir.display().to_string(),
        )]);
        let runtime_env = merge_env(&[env, &self.env, &reserved]);

        let output = run_script(
            runner,
            root_work_dir,
            &self.run,
            runtime_env,
            secrets,
            timeout,
        )
        .context("failed to run finalize")?;

        let result = FinalizeResult {
            logs: output.logs,
            err_logs: output.err_logs,
            exit_code: output.exit_code,
            output_path: root_work_dir.to_path_buf(),
        };
        crate::report::Summary::from(&result).log();
        Ok(result)
    }

    fn overwrite_config_files(&self, work_dir: &Path) -> Result<()> {
        for (file, content) in &self.configs {
            workdir::write_file_force(&work_dir.join(file), content)
                .with_context(|| format!("failed to overwrite config file {file}"))?;
        }
        Ok(())
    }
}
