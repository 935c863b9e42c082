//! Shared types for check definitions and check results.
//!
//! These types define the stable contract between the scheduler, the
//! evaluator result parser and the validator. Definitions are immutable after
//! construction; maps are `BTreeMap` so anything derived from iteration order
//! stays deterministic across runs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Identifies one check inside the quality gate structure.
///
/// The chapter/requirement/check triple names the check's working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRef {
    pub chapter: String,
    pub requirement: String,
    pub check: String,
}

impl CheckRef {
    pub fn new(chapter: &str, requirement: &str, check: &str) -> Self {
        Self {
            chapter: chapter.to_string(),
            requirement: requirement.to_string(),
            check: check.to_string(),
        }
    }

    /// Directory name for this check, `<chapter>_<requirement>_<check>`.
    pub fn uid(&self) -> String {
        format!("{}_{}_{}", self.chapter, self.requirement, self.check)
    }
}

/// Scripted definition of one compliance check.
///
/// `steps` is a pre-flattened execution plan: an ordered list of levels, each
/// level a set of steps that may run in any relative order. Dependency order
/// is resolved by an external planner; the engine never computes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autopilot {
    pub name: String,
    pub steps: Vec<Vec<Step>>,
    pub env: BTreeMap<String, String>,
    pub evaluate: Evaluate,
}

/// One scripted step of an autopilot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Unique within the autopilot.
    pub id: String,
    pub title: String,
    /// Shell script body, run via `/bin/bash -c`.
    pub run: String,
    /// Config file name -> content, materialized into the step work dir.
    pub configs: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    /// Ids of steps from earlier levels whose output this step reads.
    pub depends: Vec<String>,
}

/// The evaluation script that inspects step outputs and reports a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluate {
    pub run: String,
    pub env: BTreeMap<String, String>,
    pub configs: BTreeMap<String, String>,
}

/// Outcome of a single step run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepResult {
    pub id: String,
    /// The step's `files` output directory.
    pub output_dir: PathBuf,
    /// Present only if the step wrote its result file (`data.json`).
    pub result_file: Option<PathBuf>,
    pub logs: Vec<String>,
    pub err_logs: Vec<String>,
    pub exit_code: i32,
    /// Dependency `files` directories handed to the step.
    pub input_dirs: Vec<PathBuf>,
}

/// One criterion reported by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionResult {
    pub criterion: String,
    pub fulfilled: bool,
    pub justification: String,
    /// Extra key/value context; object values are re-serialized JSON text.
    /// An empty map is represented as `None`.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Outcome of the evaluation phase, after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluateResult {
    pub logs: Vec<String>,
    pub err_logs: Vec<String>,
    pub exit_code: i32,
    /// Final verdict, one of RED/GREEN/YELLOW/ERROR once validated.
    pub status: String,
    pub reason: String,
    pub results: Vec<CriterionResult>,
}

/// Full result of one check run, handed back to the enclosing report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutopilotResult {
    pub name: String,
    pub step_results: Vec<StepResult>,
    pub evaluate_result: EvaluateResult,
}

/// Outcome of the finalize script. Carries no verdict semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeResult {
    pub logs: Vec<String>,
    pub err_logs: Vec<String>,
    pub exit_code: i32,
    pub output_path: PathBuf,
}

/// A human-entered answer for a manual check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualResult {
    pub status: String,
    pub reason: String,
}

pub const STATUS_RED: &str = "RED";
pub const STATUS_GREEN: &str = "GREEN";
pub const STATUS_YELLOW: &str = "YELLOW";
pub const STATUS_ERROR: &str = "ERROR";

/// Whether a status is one the evaluator is allowed to report.
pub fn is_reportable_status(status: &str) -> bool {
    matches!(status, STATUS_RED | STATUS_GREEN | STATUS_YELLOW)
}

/// Render a timeout for user-facing messages, e.g. `10s`.
pub fn format_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}
