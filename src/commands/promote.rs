use crate::error::{Result, WorktreeError};
use crate::git::{find_worktree, list_worktrees, rename_branch, RepoContext};
use crate::report::Report;
use crate::utils::validate_branch_name;

/// Rename the branch checked out in a worktree. No files move.
pub fn run(
    context: &RepoContext,
    worktree_name: &str,
    new_branch: &str,
    report: &mut Report,
) -> Result<()> {
    validate_branch_name(new_branch)?;

    let worktrees = list_worktrees(context)?;
    let worktree = find_worktree(context, &worktrees, worktree_name)
        .filter(|wt| !wt.is_bare)
        .ok_or_else(|| WorktreeError::WorktreeNotFound {
            name: worktree_name.to_string(),
        })?;

    if worktree.is_detached() || worktree.branch.is_empty() {
        return Err(WorktreeError::WorktreeDetached {
            path: worktree.path.clone(),
        });
    }

    rename_branch(context, &worktree.branch, new_branch)?;
    report.info(format!(
        "Renamed branch '{}' to '{}' in {}",
        worktree.branch,
        new_branch,
        worktree.path.display()
    ));
    Ok(())
}
