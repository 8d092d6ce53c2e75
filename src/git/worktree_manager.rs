use std::fs;
use std::path::{Path, PathBuf};

use super::runner::{GitOutput, GitRunner};
use super::topology::{get_worktree_root, is_bare_worktree, BARE_DIR};
use crate::error::{Result, WorktreeError};
use crate::models::{WorktreeRecord, DETACHED};

/// Resolved project plus the runner every backend call goes through.
pub struct RepoContext {
    project_root: PathBuf,
    git_dir: PathBuf,
    runner: Box<dyn GitRunner>,
}

impl RepoContext {
    /// Resolve the project that owns `start` (a `.bare` layout or an ordinary repository).
    pub fn discover(runner: Box<dyn GitRunner>, start: &Path) -> Result<Self> {
        let project_root = get_worktree_root(runner.as_ref(), start)?;
        let bare = project_root.join(BARE_DIR);
        let git_dir = if bare.is_dir() {
            bare
        } else {
            project_root.clone()
        };
        log::debug!(
            "project root {} (git dir {})",
            project_root.display(),
            git_dir.display()
        );
        Ok(Self::new(project_root, git_dir, runner))
    }

    pub fn new(project_root: PathBuf, git_dir: PathBuf, runner: Box<dyn GitRunner>) -> Self {
        Self {
            project_root,
            git_dir,
            runner,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Fail unless the project uses the `.bare` layout. Commands that create
    /// reserved directories beside the worktrees must not run in a plain checkout.
    pub fn ensure_bare_layout(&self) -> Result<()> {
        if is_bare_worktree(&self.project_root) {
            Ok(())
        } else {
            Err(WorktreeError::NoBareRootFound {
                start: self.project_root.clone(),
            })
        }
    }

    pub fn runner(&self) -> &dyn GitRunner {
        self.runner.as_ref()
    }

    /// Path of the worktree directory called `name` under the project root.
    pub fn worktree_path(&self, name: &str) -> PathBuf {
        self.project_root.join(name)
    }

    /// Worktree directory name relative to the project root, if it lives under it.
    pub fn relative_name(&self, path: &Path) -> Option<String> {
        let relative = path
            .strip_prefix(&self.project_root)
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| {
                let root = fs::canonicalize(&self.project_root).ok()?;
                let canonical = fs::canonicalize(path).ok()?;
                canonical.strip_prefix(&root).ok().map(Path::to_path_buf)
            })?;
        let name = relative.to_string_lossy().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

fn command_output(context: &RepoContext, dir: &Path, args: &[&str]) -> Result<GitOutput> {
    Ok(context.runner.output(dir, args)?)
}

fn git_raw_in(context: &RepoContext, dir: &Path, args: &[&str]) -> Result<String> {
    let output = command_output(context, dir, args)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(WorktreeError::Git {
            command: args.join(" "),
            message: output.failure_message(),
        })
    }
}

fn git_raw(context: &RepoContext, args: &[&str]) -> Result<String> {
    git_raw_in(context, &context.git_dir, args)
}

pub fn list_worktrees(context: &RepoContext) -> Result<Vec<WorktreeRecord>> {
    let output = git_raw(context, &["worktree", "list", "--porcelain"])?;
    Ok(parse_worktree_lines(&output))
}

pub fn branch_exists(context: &RepoContext, branch: &str) -> bool {
    git_raw(
        context,
        &["rev-parse", "--verify", "--quiet", &format!("refs/heads/{}", branch)],
    )
    .is_ok()
}

/// Hash a ref points at, or `None` when the ref does not exist.
pub fn resolve_ref(context: &RepoContext, reference: &str) -> Result<Option<String>> {
    let output = command_output(
        context,
        &context.git_dir,
        &["rev-parse", "--verify", "--quiet", reference],
    )?;
    match output.code {
        Some(0) => Ok(Some(output.stdout.trim().to_string())),
        Some(1) => Ok(None),
        _ => Err(WorktreeError::Git {
            command: format!("rev-parse --verify {}", reference),
            message: output.failure_message(),
        }),
    }
}

pub fn short_hash(context: &RepoContext, reference: &str) -> Result<String> {
    Ok(git_raw(context, &["rev-parse", "--short", reference])?
        .trim()
        .to_string())
}

/// Target of a symbolic ref in short form, e.g. `origin/main` for `refs/remotes/origin/HEAD`.
pub fn symbolic_ref(context: &RepoContext, name: &str) -> Option<String> {
    git_raw(context, &["symbolic-ref", "--quiet", "--short", name])
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Whether `ancestor` is reachable from `descendant`.
pub fn is_ancestor(context: &RepoContext, ancestor: &str, descendant: &str) -> Result<bool> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    let output = command_output(context, &context.git_dir, &args)?;
    match output.code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(WorktreeError::Git {
            command: args.join(" "),
            message: output.failure_message(),
        }),
    }
}

pub fn list_remotes(context: &RepoContext) -> Result<Vec<String>> {
    let output = git_raw(context, &["remote"])?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn fetch_remote(context: &RepoContext, remote: &str) -> Result<()> {
    git_raw(context, &["fetch", remote])?;
    Ok(())
}

pub fn fetch_all(context: &RepoContext) -> Result<()> {
    git_raw(context, &["fetch", "--all"])?;
    Ok(())
}

pub fn is_dirty(context: &RepoContext, worktree_path: &Path) -> Result<bool> {
    let output = git_raw_in(context, worktree_path, &["status", "--porcelain"])?;
    Ok(!output.trim().is_empty())
}

/// Attach a worktree to an existing branch, or create the branch from `start_point` in the same step.
pub fn add_worktree(
    context: &RepoContext,
    worktree_path: &Path,
    branch_name: &str,
    start_point: Option<&str>,
) -> Result<()> {
    let path = worktree_path.to_string_lossy().to_string();
    let mut args = vec!["worktree", "add"];
    match start_point {
        Some(base) => {
            args.push("-b");
            args.push(branch_name);
            args.push(&path);
            args.push(base);
        }
        None => {
            args.push(&path);
            args.push(branch_name);
        }
    }
    git_raw(context, &args)?;
    Ok(())
}

pub fn remove_worktree(context: &RepoContext, worktree_path: &Path, force: bool) -> Result<()> {
    let path = worktree_path.to_string_lossy().to_string();
    let mut args = vec!["worktree", "remove"];
    if force {
        args.push("--force");
    }
    args.push(&path);
    git_raw(context, &args)?;
    Ok(())
}

pub fn delete_branch(context: &RepoContext, branch: &str, force: bool) -> Result<()> {
    let flag = if force { "-D" } else { "-d" };
    git_raw(context, &["branch", flag, branch])?;
    Ok(())
}

pub fn rename_branch(context: &RepoContext, old: &str, new: &str) -> Result<()> {
    git_raw(context, &["branch", "-m", old, new])?;
    Ok(())
}

pub fn update_ref(context: &RepoContext, reference: &str, hash: &str) -> Result<()> {
    git_raw(context, &["update-ref", reference, hash])?;
    Ok(())
}

pub fn reset_hard(context: &RepoContext, worktree_path: &Path, target: &str) -> Result<()> {
    git_raw_in(context, worktree_path, &["reset", "--hard", target])?;
    Ok(())
}

pub fn push_branch(context: &RepoContext, remote: &str, branch: &str) -> Result<()> {
    let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
    git_raw(context, &["push", remote, &refspec])?;
    Ok(())
}

/// Whether `refs/pull/<number>/head` is advertised by `remote`.
pub fn remote_has_ref(context: &RepoContext, remote: &str, reference: &str) -> Result<bool> {
    let output = git_raw(context, &["ls-remote", remote, reference])?;
    Ok(!output.trim().is_empty())
}

pub fn fetch_refspec(context: &RepoContext, remote: &str, refspec: &str) -> Result<()> {
    git_raw(context, &["fetch", remote, refspec])?;
    Ok(())
}

/// Look a worktree up by absolute path, by directory name under the project root, then by branch.
pub fn find_worktree<'a>(
    context: &RepoContext,
    worktrees: &'a [WorktreeRecord],
    identifier: &str,
) -> Option<&'a WorktreeRecord> {
    let trimmed = identifier.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if Path::new(trimmed).is_absolute() {
        PathBuf::from(trimmed)
    } else {
        context.worktree_path(trimmed)
    };
    let canonical = fs::canonicalize(&candidate).ok();

    worktrees
        .iter()
        .find(|wt| wt.path == candidate || canonical.as_deref() == Some(wt.path.as_path()))
        .or_else(|| {
            worktrees
                .iter()
                .find(|wt| context.relative_name(&wt.path).as_deref() == Some(trimmed))
        })
        .or_else(|| {
            worktrees
                .iter()
                .find(|wt| !wt.is_bare && !wt.is_detached() && wt.branch == trimmed)
        })
}

#[derive(Default)]
struct PartialWorktree {
    path: Option<String>,
    commit: Option<String>,
    branch: Option<String>,
    is_bare: bool,
    is_locked: bool,
    is_prunable: bool,
}

impl PartialWorktree {
    fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.commit.is_none()
            && self.branch.is_none()
            && !self.is_bare
            && !self.is_locked
            && !self.is_prunable
    }

    fn finish(self) -> WorktreeRecord {
        WorktreeRecord {
            path: PathBuf::from(self.path.unwrap_or_default()),
            branch: self.branch.unwrap_or_default(),
            commit: self.commit.unwrap_or_default(),
            is_bare: self.is_bare,
            is_locked: self.is_locked,
            is_prunable: self.is_prunable,
        }
    }
}

/// Parse `git worktree list --porcelain`. Unknown keys are ignored.
pub fn parse_worktree_lines(output: &str) -> Vec<WorktreeRecord> {
    let mut worktrees = Vec::new();
    let mut current = PartialWorktree::default();

    for line in output.lines() {
        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, v),
            None => (line, ""),
        };
        match key {
            "worktree" => {
                let previous = std::mem::take(&mut current);
                if !previous.is_empty() {
                    worktrees.push(previous.finish());
                }
                current.path = Some(value.to_string());
            }
            "HEAD" => current.commit = Some(value.to_string()),
            "branch" => {
                if current.branch.as_deref() != Some(DETACHED) {
                    let name = value.strip_prefix("refs/heads/").unwrap_or(value);
                    current.branch = Some(name.to_string());
                }
            }
            "detached" => current.branch = Some(DETACHED.to_string()),
            "bare" => current.is_bare = true,
            "locked" => current.is_locked = true,
            "prunable" => current.is_prunable = true,
            _ => {}
        }
    }

    if !current.is_empty() {
        worktrees.push(current.finish());
    }

    worktrees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locked_worktree() {
        let output = "worktree /path/to/worktree\nHEAD abc123def456\nbranch refs/heads/feature-branch\nlocked\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 1);
        assert!(worktrees[0].is_locked);
        assert_eq!(worktrees[0].branch, "feature-branch");
    }

    #[test]
    fn parse_locked_with_reason() {
        let output = "worktree /p/wt\nHEAD abc\nbranch refs/heads/x\nlocked on removable drive\n";
        let worktrees = parse_worktree_lines(output);
        assert!(worktrees[0].is_locked);
    }

    #[test]
    fn parse_prunable_worktree() {
        let output = "worktree /path/to/worktree\nHEAD abc123def456\nbranch refs/heads/stale-branch\nprunable gitdir file points to non-existent location\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 1);
        assert!(worktrees[0].is_prunable);
    }

    #[test]
    fn parse_detached_head() {
        let output = "worktree /path/to/worktree\nHEAD abc123def456\ndetached\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 1);
        assert_eq!(worktrees[0].branch, "(detached)");
        assert!(worktrees[0].is_detached());
    }

    #[test]
    fn keeps_bare_entry_flagged() {
        let output = "worktree /path/to/project/.bare\nbare\n\nworktree /path/to/project/main\nHEAD abc123def456\nbranch refs/heads/main\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 2);
        assert!(worktrees[0].is_bare);
        assert_eq!(worktrees[0].path, PathBuf::from("/path/to/project/.bare"));
        assert!(!worktrees[1].is_bare);
        assert_eq!(worktrees[1].branch, "main");
        assert_eq!(worktrees[1].commit, "abc123def456");
    }

    #[test]
    fn parse_multiple_worktrees() {
        let output = "worktree /path/to/main\nHEAD abc123\nbranch refs/heads/main\n\nworktree /path/to/feature1\nHEAD def456\nbranch refs/heads/feature/one\nlocked\n\nworktree /path/to/feature2\nHEAD 789abc\nbranch refs/heads/feature/two\nprunable\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 3);
        assert_eq!(worktrees[0].branch, "main");
        assert_eq!(worktrees[1].branch, "feature/one");
        assert!(worktrees[1].is_locked);
        assert!(worktrees[2].is_prunable);
    }

    #[test]
    fn ignores_unknown_lines() {
        let output = "worktree /p/a\nHEAD 111\nfuture-field something\nbranch refs/heads/a\n";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 1);
        assert_eq!(worktrees[0].branch, "a");
    }

    #[test]
    fn flushes_partial_trailing_record() {
        let output = "worktree /p/a\nHEAD 111\nbranch refs/heads/a\n\nworktree /p/b";
        let worktrees = parse_worktree_lines(output);
        assert_eq!(worktrees.len(), 2);
        assert_eq!(worktrees[1].path, PathBuf::from("/p/b"));
        assert_eq!(worktrees[1].commit, "");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_worktree_lines("").is_empty());
        assert!(parse_worktree_lines("\n\n").is_empty());
    }
}
