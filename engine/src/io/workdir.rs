//! Working-directory collaborator operations.
//!
//! Thin, contextualized wrappers around the filesystem plus the link/unlink
//! bridge that makes shared root-directory files visible inside a step's
//! work directory without copying them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Create (or reuse) a directory `name` under `parent`, returning its path.
pub fn create_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("create directory {}", dir.display()))?;
    Ok(dir)
}

/// Create a file with the given contents, failing if it already exists.
pub fn create_file(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        anyhow::bail!("file {} already exists", path.display());
    }
    fs::write(path, contents).with_context(|| format!("create file {}", path.display()))
}

/// Write a file, creating or overwriting it unconditionally.
pub fn write_file_force(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

/// Symlinks bridged into a work directory, removed again on drop.
#[derive(Debug, Default)]
pub struct LinkedFiles {
    links: Vec<PathBuf>,
}

impl Drop for LinkedFiles {
    fn drop(&mut self) {
        for link in &self.links {
            if let Err(e) = fs::remove_file(link) {
                warn!(link = %link.display(), err = %e, "failed to remove linked file");
            }
        }
    }
}

/// Symlink every file of `src_dir` into `dst_dir`.
///
/// Subdirectories are not bridged; the check directories live under the root
/// work dir and linking them into a step would create cycles. Files whose
/// name already exists in `dst_dir` are skipped; `src_dir` is never mutated.
/// The returned guard removes the created links when dropped, so the bridge
/// is reversed on every exit path.
pub fn link_files(src_dir: &Path, dst_dir: &Path) -> Result<LinkedFiles> {
    let mut linked = LinkedFiles::default();
    let entries = fs::read_dir(src_dir)
        .with_context(|| format!("read shared directory {}", src_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", src_dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            continue;
        }
        let target = dst_dir.join(entry.file_name());
        if target.exists() {
            continue;
        }
        symlink(&entry.path(), &target).with_context(|| {
            format!(
                "link {} into {}",
                entry.path().display(),
                dst_dir.display()
            )
        })?;
        linked.links.push(target);
    }
    Ok(linked)
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}
