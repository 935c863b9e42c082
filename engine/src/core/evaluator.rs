//! Folding of evaluator data records into a status, reason and results.
//!
//! The evaluator reports through newline-delimited JSON objects on stdout.
//! Records are folded left to right: `status` and `reason` override earlier
//! values (last write wins, so diagnostic-then-final protocols work), each
//! `result` object appends one [`CriterionResult`]. Fields of the wrong type
//! are skipped individually; a malformed record never aborts the fold.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::core::types::CriterionResult;

/// Raw evaluation outcome before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalOutcome {
    pub status: String,
    pub reason: String,
    pub results: Vec<CriterionResult>,
}

#[derive(Debug, Default, Deserialize)]
struct EvalRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    result: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawResult {
    #[serde(default, deserialize_with = "lenient_string")]
    criterion: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    fulfilled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    justification: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    metadata: Option<Map<String, Value>>,
}

/// Fold the ordered data records of one evaluation run.
pub fn fold_records(records: &[Value]) -> EvalOutcome {
    let mut outcome = EvalOutcome::default();

    for record in records {
        let Ok(record) = serde_json::from_value::<EvalRecord>(record.clone()) else {
            // Not an object (e.g. a bare scalar line), nothing to take from it.
            continue;
        };
        if let Some(status) = record.status {
            outcome.status = status;
        }
        if let Some(reason) = record.reason {
            outcome.reason = reason;
        }
        if let Some(result) = record.result {
            outcome.results.push(parse_result(result));
        }
    }

    outcome
}

fn parse_result(raw: Map<String, Value>) -> CriterionResult {
    let raw: RawResult = serde_json::from_value(Value::Object(raw)).unwrap_or_default();
    CriterionResult {
        criterion: raw.criterion.unwrap_or_default(),
        fulfilled: raw.fulfilled.unwrap_or_default(),
        justification: raw.justification.unwrap_or_default(),
        metadata: raw.metadata.and_then(stringify_metadata),
    }
}

/// Stringify metadata values; an empty map collapses to `None`.
///
/// Object and array values are re-serialized to JSON text so they fit the
/// string-to-string metadata contract; strings are taken verbatim.
fn stringify_metadata(metadata: Map<String, Value>) -> Option<BTreeMap<String, String>> {
    if metadata.is_empty() {
        return None;
    }
    Some(
        metadata
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect(),
    )
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    })
}

fn lenient_object<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Map<String, Value>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Object(m)) => Some(m),
        _ => None,
    })
}
