//! Secret values and their redaction from captured output.
//!
//! Secrets are an immutable per-run snapshot. Every captured log line passes
//! through [`Secrets::redact`] before it is stored or emitted, so configured
//! secret values never appear verbatim in results or diagnostics.

use std::collections::BTreeMap;

/// A fixed set of named secret values.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    values: BTreeMap<String, String>,
}

impl Secrets {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Name/value pairs, for handing the secrets to a child process.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    /// Replace each occurrence of a secret value with `***<NAME>***`.
    ///
    /// Empty secret values are skipped, they would match everywhere.
    pub fn redact(&self, line: &str) -> String {
        let mut out = line.to_string();
        for (name, value) in &self.values {
            if value.is_empty() {
                continue;
            }
            out = out.replace(value, &format!("***{name}***"));
        }
        out
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Secrets {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_every_occurrence() {
        let secrets = Secrets::from([("TOKEN", "s3cr3t")]);
        assert_eq!(
            secrets.redact("s3cr3t in the middle, s3cr3t at the end: s3cr3t"),
            "***TOKEN*** in the middle, ***TOKEN*** at the end: ***TOKEN***"
        );
    }

    #[test]
    fn redact_handles_multiple_secrets() {
        let secrets = Secrets::from([("A", "alpha"), ("B", "beta")]);
        assert_eq!(secrets.redact("alpha beta"), "***A*** ***B***");
    }

    #[test]
    fn empty_values_never_match() {
        let secrets = Secrets::from([("EMPTY", "")]);
        assert_eq!(secrets.redact("untouched"), "untouched");
    }

    #[test]
    fn lines_without_secrets_pass_through() {
        let secrets = Secrets::from([("TOKEN", "s3cr3t")]);
        assert_eq!(secrets.redact("nothing to hide"), "nothing to hide");
    }
}
