//! Uniform summary emission for check outcomes.
//!
//! Automated, manual and finalize executions all funnel through [`Summary`]
//! so the enclosing report reads the same regardless of how the answer was
//! produced. Output goes to the injected tracing subscriber at info level as
//! indented key/value lines.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::core::types::{AutopilotResult, CriterionResult, FinalizeResult, ManualResult};

/// Outcome summary of one execution, logged field by field.
///
/// Empty fields are omitted from the output.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub name: String,
    pub exit_code: i32,
    pub status: String,
    pub reason: String,
    pub evidence_path: Option<PathBuf>,
    pub results: Vec<CriterionResult>,
    pub logs: Vec<String>,
    pub err_logs: Vec<String>,
}

impl Summary {
    pub fn log(&self) {
        if self.exit_code != 0 {
            key_value(2, "Exit Code:", &self.exit_code.to_string());
        }
        if !self.status.is_empty() {
            key_value(2, "Status:", &self.status);
        }
        if !self.reason.is_empty() {
            key_value(2, "Reason:", &self.reason);
        }
        if let Some(path) = &self.evidence_path {
            key_value(2, "Evidence Path:", &path.display().to_string());
        }
        if !self.results.is_empty() {
            key_value(2, "Results:", "");
            for r in &self.results {
                key_value(4, "- Criterion:", &r.criterion);
                key_value(6, "Fulfilled:", &r.fulfilled.to_string());
                key_value(6, "Justification:", &r.justification);
                if let Some(metadata) = &r.metadata {
                    format_map(6, "Metadata:", metadata);
                }
            }
        }
        if !self.logs.is_empty() {
            key_value(2, "Logs:", "");
            for line in &self.logs {
                key_value(4, line, "");
            }
        }
        if !self.err_logs.is_empty() {
            key_value(2, "Error Logs:", "");
            for line in &self.err_logs {
                key_value(4, line, "");
            }
        }
    }
}

fn key_value(indent: usize, key: &str, value: &str) {
    if key.is_empty() && value.is_empty() {
        return;
    }
    let line = format!("{}{key} {value}", " ".repeat(indent));
    info!("{}", line.trim_end());
}

fn format_map(indent: usize, key: &str, map: &BTreeMap<String, String>) {
    key_value(indent, key, "");
    for (k, v) in map {
        key_value(indent + 2, &format!("{k}:"), v);
    }
}

impl From<&AutopilotResult> for Summary {
    fn from(result: &AutopilotResult) -> Self {
        Self {
            name: result.name.clone(),
            exit_code: result.evaluate_result.exit_code,
            status: result.evaluate_result.status.clone(),
            reason: result.evaluate_result.reason.clone(),
            results: result.evaluate_result.results.clone(),
            logs: result.evaluate_result.logs.clone(),
            err_logs: result.evaluate_result.err_logs.clone(),
            ..Default::default()
        }
    }
}

impl From<&ManualResult> for Summary {
    fn from(result: &ManualResult) -> Self {
        Self {
            status: result.status.clone(),
            reason: result.reason.clone(),
            ..Default::default()
        }
    }
}

impl From<&FinalizeResult> for Summary {
    fn from(result: &FinalizeResult) -> Self {
        Self {
            exit_code: result.exit_code,
            logs: result.logs.clone(),
            err_logs: result.err_logs.clone(),
            ..Default::default()
        }
    }
}
