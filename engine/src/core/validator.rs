//! Verdict validation state machine.
//!
//! Turns exit code + parsed evaluator output + the strict/lenient policy into
//! the final verdict. Rules fire in strict priority order, first match wins:
//!
//! 1. non-zero exit code (124 reported as timeout) -> ERROR
//! 2. status outside RED/GREEN/YELLOW -> ERROR
//! 3. missing reason/results/criterion/justification -> ERROR under strict,
//!    warning under lenient
//!
//! Terminal in all cases; content problems never become call errors.

use std::time::Duration;

use tracing::{error, warn};

use crate::core::types::{AutopilotResult, STATUS_ERROR, format_timeout, is_reportable_status};

/// Apply the verdict rules in place.
pub fn validate(result: &mut AutopilotResult, strict: bool, timeout: Duration) {
    let name = result.name.clone();
    let eval = &mut result.evaluate_result;

    if eval.exit_code != 0 {
        let msg = if eval.exit_code == 124 {
            format!(
                "autopilot '{name}' timed out after {}",
                format_timeout(timeout)
            )
        } else {
            format!(
                "autopilot '{name}' exited with exit code {}",
                eval.exit_code
            )
        };
        eval.status = STATUS_ERROR.to_string();
        eval.reason = msg.clone();
        error!("{msg}");
        return;
    }

    if !is_reportable_status(&eval.status) {
        let msg = format!(
            "autopilot '{name}' provided an invalid 'status': '{}'",
            eval.status
        );
        eval.status = STATUS_ERROR.to_string();
        eval.reason = msg.clone();
        error!("{msg}");
        return;
    }

    let mut msgs = Vec::new();
    if eval.reason.is_empty() {
        msgs.push(format!("autopilot '{name}' did not provide a 'reason'"));
    }
    if eval.results.is_empty() {
        msgs.push(format!("autopilot '{name}' did not provide any 'results'"));
    }
    for (i, r) in eval.results.iter().enumerate() {
        if r.criterion.is_empty() {
            msgs.push(format!(
                "autopilot '{name}' did not provide a 'criterion' in result '{i}'"
            ));
        }
        if r.justification.is_empty() {
            msgs.push(format!(
                "autopilot '{name}' did not provide a 'justification' in result '{i}'"
            ));
        }
    }
    if msgs.is_empty() {
        return;
    }

    let msg = msgs.join("; ");
    if strict {
        eval.status = STATUS_ERROR.to_string();
        eval.reason = msg.clone();
        error!("{msg}");
    } else {
        warn!("{msg}");
    }
}
