//! Orchestration of one autopilot check, from step scheduling to verdict.
//!
//! Steps are executed level by level: every step of level N finishes before
//! level N+1 starts, because later levels may read earlier levels' output
//! files. Each step owns an exclusive directory subtree; cross-step sharing
//! happens only through explicit dependency input directories and the shared
//! root directory, which is bridged into the step work dir via symlinks for
//! the duration of the step.
//!
//! Infrastructure failures (directories, missing dependency output, spawn
//! errors) abort the check with a call error. Evaluation-content failures
//! (non-zero exit, bad status, missing fields) are captured in-band in the
//! returned [`AutopilotResult`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{error, info, instrument, warn};

use crate::core::env::{PATH_LIST_SEPARATOR, join_path_list, merge_env};
use crate::core::evaluator::fold_records;
use crate::core::secrets::Secrets;
use crate::core::types::{
    Autopilot, AutopilotResult, CheckRef, EvaluateResult, STATUS_ERROR, Step, StepResult,
};
use crate::core::validator::validate;
use crate::io::executor::run_script;
use crate::io::runner::{Runner, RunnerOutput};
use crate::io::workdir;
use crate::report::Summary;

/// Name of the file a step writes its machine-readable result to.
const STEP_RESULT_FILE: &str = "data.json";
/// Name of the combined log file written next to each run.
const LOGS_FILE: &str = "logs.txt";

/// One automated check, ready to execute.
#[derive(Debug, Clone, Default)]
pub struct AutopilotCheck {
    pub check_ref: CheckRef,
    pub autopilot: Autopilot,
    /// Errors found by upstream validation; non-empty skips execution.
    pub validation_errs: Vec<String>,
    /// Optional app installation directory, exposed as `APPS` and prepended
    /// to `PATH`.
    pub app_path: Option<PathBuf>,
}

impl AutopilotCheck {
    /// Execute all step levels and the evaluation, returning the graded
    /// result.
    ///
    /// Returns `Err` only for infrastructure failures; every evaluation
    /// outcome, including timeouts and invalid evaluator output, comes back
    /// as a normally returned result.
    #[instrument(skip_all, fields(check = %self.check_ref.uid(), autopilot = %self.autopilot.name))]
    pub fn execute(
        &self,
        root_work_dir: &Path,
        env: &BTreeMap<String, String>,
        secrets: &Secrets,
        strict: bool,
        timeout: Duration,
        runner: &dyn Runner,
    ) -> Result<AutopilotResult> {
        if let Some(result) = self.skip_on_validation_errors() {
            return Ok(result);
        }

        let sys_path = self.system_path();
        let check_uid = self.check_ref.uid();
        let check_dir = workdir::create_dir(root_work_dir, &check_uid)
            .with_context(|| format!("create check directory for check '{check_uid}'"))?;

        let mut step_results = Vec::new();
        if self.autopilot.steps.iter().any(|level| !level.is_empty()) {
            let steps_dir = workdir::create_dir(&check_dir, "steps")
                .with_context(|| format!("create steps directory for check '{check_uid}'"))?;
            for level in &self.autopilot.steps {
                // Level boundary: all steps of this level finish before the
                // next level starts.
                for step in level {
                    let result = self.run_step(
                        step,
                        &steps_dir,
                        root_work_dir,
                        env,
                        secrets,
                        &sys_path,
                        timeout,
                        runner,
                    )?;
                    step_results.push(result);
                }
            }
        }

        let eval_output = self.run_evaluation(
            &check_dir,
            &step_results,
            env,
            secrets,
            &sys_path,
            timeout,
            runner,
        )?;
        let outcome = fold_records(&eval_output.data);

        let mut result = AutopilotResult {
            name: self.autopilot.name.clone(),
            step_results,
            evaluate_result: EvaluateResult {
                logs: eval_output.logs,
                err_logs: eval_output.err_logs,
                exit_code: eval_output.exit_code,
                status: outcome.status,
                reason: outcome.reason,
                results: outcome.results,
            },
        };
        validate(&mut result, strict, timeout);

        let mut summary = Summary::from(&result);
        summary.evidence_path = Some(check_dir);
        summary.log();
        Ok(result)
    }

    /// Precomputed validation errors short-circuit the whole run: no
    /// filesystem access, immediate ERROR verdict.
    fn skip_on_validation_errors(&self) -> Option<AutopilotResult> {
        if self.validation_errs.is_empty() {
            return None;
        }
        let msg = format!(
            "autopilot '{}' has the following validation errors and won't be executed: {}",
            self.autopilot.name,
            self.validation_errs.join("\n")
        );
        error!("{msg}");
        Some(AutopilotResult {
            name: self.autopilot.name.clone(),
            step_results: Vec::new(),
            evaluate_result: EvaluateResult {
                exit_code: 0,
                status: STATUS_ERROR.to_string(),
                reason: msg,
                ..Default::default()
            },
        })
    }

    fn system_path(&self) -> String {
        let sys_path = std::env::var("PATH").unwrap_or_default();
        match &self.app_path {
            Some(app_path) => format!(
                "{}{PATH_LIST_SEPARATOR}{sys_path}",
                app_path.display()
            ),
            None => sys_path,
        }
    }

    fn app_path_value(&self) -> String {
        self.app_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &self,
        step: &Step,
        steps_dir: &Path,
        root_work_dir: &Path,
        env: &BTreeMap<String, String>,
        secrets: &Secrets,
        sys_path: &str,
        timeout: Duration,
        runner: &dyn Runner,
    ) -> Result<StepResult> {
        let dirs = prepare_step_dirs(steps_dir, &step.id)
            .with_context(|| format!("create step directories for step '{}'", step.id))?;
        create_config_files(&step.configs, &dirs.work_dir)
            .with_context(|| format!("create config files for step '{}'", step.id))?;

        // Bridge shared root files into the work dir; the guard unlinks them
        // on every exit path.
        let _linked = workdir::link_files(root_work_dir, &dirs.work_dir)
            .with_context(|| format!("link files for step '{}'", step.id))?;

        let mut input_dirs = Vec::new();
        for depend in &step.depends {
            let depend_dir = steps_dir.join(depend).join("files");
            if !depend_dir.is_dir() {
                bail!(
                    "step '{}' depends on '{depend}' but the step doesn't exist or didn't execute properly",
                    step.id
                );
            }
            input_dirs.push(depend_dir);
        }

        let result_file = dirs.step_dir.join(STEP_RESULT_FILE);
        let reserved = reserved_env(&[
            ("APPS", self.app_path_value()),
            ("PATH", sys_path.to_string()),
            (
                "AUTOPILOT_OUTPUT_DIR",
                dirs.files_dir.display().to_string(),
            ),
            ("AUTOPILOT_INPUT_DIRS", join_path_list(&input_dirs)),
            ("AUTOPILOT_RESULT_FILE", result_file.display().to_string()),
        ]);
        let runtime_env = merge_env(&[env, &step.env, &self.autopilot.env, &reserved]);

        info!(
            "starting autopilot '{}' step '{}'",
            self.autopilot.name, step.id
        );
        let output = run_script(
            runner,
            &dirs.work_dir,
            &step.run,
            runtime_env,
            secrets,
            timeout,
        )
        .with_context(|| {
            format!(
                "failed to run autopilot '{}' step '{}'",
                self.autopilot.name, step.id
            )
        })?;

        let result = StepResult {
            id: step.id.clone(),
            output_dir: dirs.files_dir,
            result_file: result_file.exists().then_some(result_file),
            logs: output.logs,
            err_logs: output.err_logs,
            exit_code: output.exit_code,
            input_dirs,
        };
        if let Err(e) = write_logs(&dirs.step_dir, &result.logs, &result.err_logs) {
            warn!(
                err = %e,
                "couldn't write logs for autopilot '{}' step '{}'",
                self.autopilot.name, step.id
            );
        }
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_evaluation(
        &self,
        check_dir: &Path,
        step_results: &[StepResult],
        env: &BTreeMap<String, String>,
        secrets: &Secrets,
        sys_path: &str,
        timeout: Duration,
        runner: &dyn Runner,
    ) -> Result<RunnerOutput> {
        let eval_dir = workdir::create_dir(check_dir, "evaluation")
            .context("create evaluation directory")?;
        create_config_files(&self.autopilot.evaluate.configs, &eval_dir)
            .context("create configuration files for evaluation")?;

        // Only result files the steps actually wrote are handed over.
        let input_files: Vec<PathBuf> = step_results
            .iter()
            .filter_map(|step| step.result_file.clone())
            .filter(|file| file.exists())
            .collect();

        let reserved = reserved_env(&[
            ("PATH", sys_path.to_string()),
            ("EVALUATOR_INPUT_FILES", join_path_list(&input_files)),
            (
                "EVALUATOR_RESULT_FILE",
                eval_dir.join("result.json").display().to_string(),
            ),
        ]);
        let runtime_env = merge_env(&[env, &self.autopilot.evaluate.env, &reserved]);

        info!("doing evaluation");
        let output = run_script(
            runner,
            &eval_dir,
            &self.autopilot.evaluate.run,
            runtime_env,
            secrets,
            timeout,
        )
        .with_context(|| {
            format!("failed to run autopilot '{}' evaluation", self.autopilot.name)
        })?;

        if !output.logs.is_empty()
            && let Err(e) = write_logs(&eval_dir, &output.logs, &output.err_logs)
        {
            warn!(
                err = %e,
                "failed to write logs for autopilot '{}' evaluation",
                self.autopilot.name
            );
        }
        Ok(output)
    }
}

struct StepDirs {
    step_dir: PathBuf,
    work_dir: PathBuf,
    files_dir: PathBuf,
}

fn prepare_step_dirs(steps_dir: &Path, step_id: &str) -> Result<StepDirs> {
    let step_dir = workdir::create_dir(steps_dir, step_id)
        .with_context(|| format!("create step directory for step '{step_id}'"))?;
    let work_dir = workdir::create_dir(&step_dir, "work")
        .with_context(|| format!("create work directory for step '{step_id}'"))?;
    let files_dir = workdir::create_dir(&step_dir, "files")
        .with_context(|| format!("create output directory for step '{step_id}'"))?;
    Ok(StepDirs {
        step_dir,
        work_dir,
        files_dir,
    })
}

/// Materialize config files, refusing to overwrite pre-existing content.
///
/// Unlike finalize's force-overwrite, step and evaluation config files must
/// not silently clobber what a previous run or a collaborator put there.
fn create_config_files(configs: &BTreeMap<String, String>, dir: &Path) -> Result<()> {
    for (file, content) in configs {
        workdir::create_file(&dir.join(file), content)
            .with_context(|| format!("failed to write configuration file '{file}'"))?;
    }
    Ok(())
}

fn write_logs(dir: &Path, logs: &[String], err_logs: &[String]) -> Result<()> {
    let mut combined = logs.to_vec();
    combined.extend_from_slice(err_logs);
    workdir::create_file(&dir.join(LOGS_FILE), &combined.join("\n"))
}

fn reserved_env(pairs: &[(&str, String)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_with(autopilot: Autopilot) -> AutopilotCheck {
        AutopilotCheck {
            check_ref: CheckRef::new("chapter", "requirement", "check"),
            autopilot,
            validation_errs: Vec::new(),
            app_path: None,
        }
    }

    /// A zero-value check is constructible for incremental assembly; its
    /// identifiers default to empty strings.
    #[test]
    fn default_check_has_empty_identifiers() {
        let check = AutopilotCheck::default();
        assert_eq!(check.check_ref.uid(), "__");
        assert!(check.validation_errs.is_empty());
        assert!(check.app_path.is_none());
    }

    /// Precomputed validation errors skip execution entirely: the root work
    /// dir is never touched and the result carries every joined message.
    #[test]
    fn validation_errors_skip_execution_without_filesystem_writes() {
        let mut check = check_with(Autopilot {
            name: "autopilot".to_string(),
            ..Default::default()
        });
        check.validation_errs = vec!["first error".to_string(), "second error".to_string()];

        let temp = tempfile::tempdir().expect("tempdir");
        let missing_root = temp.path().join("never-created");
        let result = check
            .execute(
                &missing_root,
                &BTreeMap::new(),
                &Secrets::default(),
                true,
                Duration::from_secs(1),
                &crate::io::runner::SubprocessRunner,
            )
            .expect("execute");

        assert!(!missing_root.exists());
        assert!(result.step_results.is_empty());
        assert_eq!(result.evaluate_result.status, "ERROR");
        assert_eq!(
            result.evaluate_result.reason,
            "autopilot 'autopilot' has the following validation errors and won't be executed: \
             first error\nsecond error"
        );
        assert_eq!(result.evaluate_result.exit_code, 0);
    }

    /// A declared dependency whose output directory is missing aborts the
    /// check with a call error, not a graded result.
    #[test]
    fn missing_dependency_output_is_fatal() {
        let check = check_with(Autopilot {
            name: "autopilot".to_string(),
            steps: vec![vec![Step {
                id: "needy".to_string(),
                run: "true".to_string(),
                depends: vec!["ghost".to_string()],
                ..Default::default()
            }]],
            ..Default::default()
        });

        let temp = tempfile::tempdir().expect("tempdir");
        let err = check
            .execute(
                temp.path(),
                &BTreeMap::new(),
                &Secrets::default(),
                false,
                Duration::from_secs(5),
                &crate::io::runner::SubprocessRunner,
            )
            .unwrap_err();
        assert!(
            format!("{err:#}").contains("depends on 'ghost'"),
            "unexpected error: {err:#}"
        );
    }

    /// Step config materialization refuses to overwrite files left behind by
    /// an earlier run into the same root directory.
    #[test]
    fn rerun_into_same_root_refuses_to_clobber_configs() {
        let autopilot = Autopilot {
            name: "autopilot".to_string(),
            steps: vec![vec![Step {
                id: "step".to_string(),
                run: "true".to_string(),
                configs: BTreeMap::from([("config1".to_string(), "value1".to_string())]),
                ..Default::default()
            }]],
            evaluate: crate::core::types::Evaluate {
                run: "echo '{\"status\": \"GREEN\", \"reason\": \"ok\"}'".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let check = check_with(autopilot);
        let temp = tempfile::tempdir().expect("tempdir");
        let env = BTreeMap::new();

        check
            .execute(
                temp.path(),
                &env,
                &Secrets::default(),
                false,
                Duration::from_secs(5),
                &crate::io::runner::SubprocessRunner,
            )
            .expect("first run");

        let err = check
            .execute(
                temp.path(),
                &env,
                &Secrets::default(),
                false,
                Duration::from_secs(5),
                &crate::io::runner::SubprocessRunner,
            )
            .unwrap_err();
        assert!(
            format!("{err:#}").contains("config files for step 'step'"),
            "unexpected error: {err:#}"
        );
    }
}
