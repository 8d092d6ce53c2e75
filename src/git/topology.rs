use std::fs;
use std::path::{Path, PathBuf};

use super::runner::GitRunner;
use crate::error::{Result, WorktreeError};
use crate::models::RepoType;

/// Name of the shared object store directory inside a project.
pub const BARE_DIR: &str = ".bare";

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Turn a path printed by `git rev-parse` (possibly relative to `dir`) into an absolute one.
fn absolutize(dir: &Path, printed: &str) -> PathBuf {
    let printed = Path::new(printed.trim());
    if printed.is_absolute() {
        resolve(printed)
    } else {
        resolve(&dir.join(printed))
    }
}

fn rev_parse(git: &dyn GitRunner, dir: &Path, flag: &str) -> Option<String> {
    match git.output(dir, &["rev-parse", flag]) {
        Ok(out) if out.success() => Some(out.stdout.trim().to_string()),
        _ => None,
    }
}

/// Classify `dir` as a normal checkout, a linked worktree, a bare store or none of those.
pub fn detect_repository_type(git: &dyn GitRunner, dir: &Path) -> RepoType {
    if rev_parse(git, dir, "--is-inside-work-tree").as_deref() == Some("true") {
        let common = rev_parse(git, dir, "--git-common-dir");
        let own = rev_parse(git, dir, "--git-dir");
        return match (common, own) {
            (Some(common), Some(own)) if absolutize(dir, &common) != absolutize(dir, &own) => {
                RepoType::Worktree
            }
            _ => RepoType::Normal,
        };
    }

    if rev_parse(git, dir, "--is-bare-repository").as_deref() == Some("true") {
        if let Some(git_dir) = rev_parse(git, dir, "--git-dir") {
            if absolutize(dir, &git_dir) == resolve(dir) {
                return RepoType::Bare;
            }
        }
    }

    RepoType::Unknown
}

/// Walk upward from `start` to the project directory that holds a `.bare` store.
pub fn find_bare_root(start: &Path) -> Result<PathBuf> {
    let start = resolve(start);
    let mut current = Some(start.as_path());

    while let Some(dir) = current {
        if dir.file_name().and_then(|n| n.to_str()) == Some(BARE_DIR) {
            if let Some(parent) = dir.parent() {
                return Ok(parent.to_path_buf());
            }
        }
        if dir.join(BARE_DIR).is_dir() {
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    Err(WorktreeError::NoBareRootFound { start })
}

/// Project root for `start`: the `.bare` owner when there is one, otherwise the
/// directory that holds the repository's common git directory.
pub fn get_worktree_root(git: &dyn GitRunner, start: &Path) -> Result<PathBuf> {
    if let Ok(root) = find_bare_root(start) {
        return Ok(root);
    }

    let common = rev_parse(git, start, "--git-common-dir").ok_or_else(|| {
        WorktreeError::NotAGitRepository {
            path: start.to_path_buf(),
        }
    })?;
    let common = absolutize(start, &common);

    let strip = matches!(
        common.file_name().and_then(|n| n.to_str()),
        Some(BARE_DIR) | Some(".git")
    );
    match common.parent() {
        Some(parent) if strip => Ok(parent.to_path_buf()),
        _ => Ok(common),
    }
}

/// Gate for the bare-pattern commands.
pub fn is_bare_worktree(start: &Path) -> bool {
    find_bare_root(start).is_ok()
}
