use std::path::PathBuf;

use super::sync_shared_best_effort;
use crate::error::{Result, WorktreeError};
use crate::git::{add_worktree, branch_exists, fetch_all, RepoContext};
use crate::models::AddOptions;
use crate::report::Report;
use crate::utils::validate_branch_name;

/// Create the worktree `<root>/<name>`, attaching to branch `name` when it
/// already exists and otherwise branching it from the base.
pub fn run(
    context: &RepoContext,
    name: &str,
    options: &AddOptions,
    report: &mut Report,
) -> Result<PathBuf> {
    validate_branch_name(name)?;

    let worktree_path = context.worktree_path(name);
    if worktree_path.exists() {
        return Err(WorktreeError::DirectoryAlreadyExists {
            path: worktree_path,
        });
    }

    let base = options
        .base_branch
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or("HEAD");

    if options.fetch {
        if let Err(e) = fetch_all(context) {
            log::debug!("fetch before add failed (ignored): {}", e);
        }
    }

    if branch_exists(context, name) {
        add_worktree(context, &worktree_path, name, None)?;
        report.info(format!("Created worktree at {}", worktree_path.display()));
        report.info(format!("Using existing branch '{}'", name));
    } else {
        add_worktree(context, &worktree_path, name, Some(base))?;
        report.info(format!("Created worktree at {}", worktree_path.display()));
        report.info(format!("Created branch '{}' from '{}'", name, base));
    }

    sync_shared_best_effort(context, name, report);

    report.info(format!("Next step: cd {}", worktree_path.display()));
    Ok(worktree_path)
}
