//! Environment map merging and path-list joining.

use std::collections::BTreeMap;
use std::path::Path;

/// Platform separator for path-list environment variables.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";

/// Merge environment maps, later maps taking precedence over earlier ones.
pub fn merge_env(layers: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for layer in layers {
        for (key, value) in *layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Join paths into a path-list value (`AUTOPILOT_INPUT_DIRS` and friends).
pub fn join_path_list<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| p.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(PATH_LIST_SEPARATOR)
}
