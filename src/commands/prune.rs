use super::status_label;
use crate::error::{Result, WorktreeError};
use crate::git::{
    delete_branch, is_ancestor, is_dirty, list_remotes, list_worktrees, remove_worktree,
    resolve_base_branch, strip_remote_prefix, RepoContext, BARE_DIR,
};
use crate::models::PruneOptions;
use crate::report::Report;

/// Remove every worktree whose branch is fully merged into the base, then
/// delete the branch. Returns how many worktrees were (or would be) pruned.
pub fn run(context: &RepoContext, options: &PruneOptions, report: &mut Report) -> Result<usize> {
    let base = resolve_base_branch(context, options.base_branch.as_deref(), true)?;
    let remotes = list_remotes(context).unwrap_or_default();
    let base_short = strip_remote_prefix(&base, &remotes).to_string();
    log::debug!("pruning worktrees merged into {}", base);

    let worktrees = list_worktrees(context)?;
    let mut pruned = 0;

    for wt in &worktrees {
        if wt.is_bare
            || wt.path == context.git_dir()
            || wt.path.file_name().is_some_and(|n| n == BARE_DIR)
            || wt.path == context.project_root()
        {
            continue;
        }

        let path = wt.path.clone();
        if wt.is_locked {
            report.warn(format!("Skipping: {}", WorktreeError::WorktreeLocked { path }));
            continue;
        }
        if wt.is_detached() || wt.branch.is_empty() {
            report.warn(format!("Skipping: {}", WorktreeError::WorktreeDetached { path }));
            continue;
        }
        if wt.branch == base || wt.branch == base_short {
            report.warn(format!(
                "Skipping {}: '{}' is the base branch",
                wt.path.display(),
                wt.branch
            ));
            continue;
        }

        let merged = match is_ancestor(context, &format!("refs/heads/{}", wt.branch), &base) {
            Ok(merged) => merged,
            Err(e) => {
                report.warn(format!(
                    "Could not check whether '{}' is merged into {}: {}",
                    wt.branch, base, e
                ));
                continue;
            }
        };
        if !merged {
            continue;
        }

        let dirty = match is_dirty(context, &wt.path) {
            Ok(dirty) => dirty,
            Err(e) => {
                report.warn(format!("Could not read status of {}: {}", wt.path.display(), e));
                continue;
            }
        };
        if dirty && !options.force {
            report.warn(format!(
                "Skipping: {} (use --force to remove anyway)",
                WorktreeError::WorktreeDirty { path }
            ));
            continue;
        }

        if options.dry_run {
            report.info(format!(
                "Would remove worktree {} (branch {}, {})",
                wt.path.display(),
                wt.branch,
                status_label(dirty)
            ));
        } else {
            remove_worktree(context, &wt.path, options.force)?;
            delete_branch(context, &wt.branch, true)?;
            report.info(format!(
                "Removed worktree {} and branch '{}'",
                wt.path.display(),
                wt.branch
            ));
        }
        pruned += 1;
    }

    if pruned == 0 {
        report.info("No worktrees pruned.");
    }
    Ok(pruned)
}
