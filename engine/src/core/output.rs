//! Classification of captured script output.
//!
//! Each stream is split into lines; empty lines are dropped. A stdout line
//! that parses as a JSON value is retained twice: redacted as a log line, and
//! parsed into the ordered `data` sequence that feeds the evaluator result
//! parser. JSON on stderr is diagnostic only and never enters `data`.

use serde_json::Value;

use crate::core::secrets::Secrets;

/// Classified output of one script run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// Redacted stdout lines, JSON and plain text alike, in emission order.
    pub logs: Vec<String>,
    /// Redacted stderr lines.
    pub err_logs: Vec<String>,
    /// Structured records parsed from stdout JSON lines, in emission order.
    pub data: Vec<Value>,
}

/// Classify the raw stdout/stderr text of one script run.
///
/// Data records are parsed from the raw line; redaction applies to log lines
/// only, JSON validity must not depend on the secret set.
pub fn parse_streams(stdout: &str, stderr: &str, secrets: &Secrets) -> ParsedOutput {
    let mut out = ParsedOutput::default();

    for line in stdout.lines() {
        if line.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            out.data.push(value);
        }
        out.logs.push(secrets.redact(line));
    }

    for line in stderr.lines() {
        if line.is_empty() {
            continue;
        }
        out.err_logs.push(secrets.redact(line));
    }

    out
}
