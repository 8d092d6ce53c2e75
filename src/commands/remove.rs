use super::status_label;
use crate::error::{Result, WorktreeError};
use crate::git::{delete_branch, find_worktree, is_dirty, list_worktrees, remove_worktree, RepoContext};
use crate::models::RemoveOptions;
use crate::report::Report;

pub fn run(
    context: &RepoContext,
    name: &str,
    options: &RemoveOptions,
    report: &mut Report,
) -> Result<()> {
    let worktrees = list_worktrees(context)?;
    let worktree = find_worktree(context, &worktrees, name).ok_or_else(|| {
        WorktreeError::WorktreeNotFound {
            name: name.to_string(),
        }
    })?;

    if worktree.is_bare || worktree.path.as_path() == context.git_dir() {
        return Err(WorktreeError::CannotRemoveBareWorktree);
    }

    let delete = options.delete_branch && !worktree.is_detached();

    if options.dry_run {
        let status = match is_dirty(context, &worktree.path) {
            Ok(dirty) => status_label(dirty),
            Err(e) => {
                report.warn(format!(
                    "Could not read status of {}: {}",
                    worktree.path.display(),
                    e
                ));
                "unknown"
            }
        };
        report.info(format!("Would remove worktree {}", worktree.path.display()));
        report.info(format!("  Branch: {}", worktree.branch));
        report.info(format!("  Status: {}", status));
        if delete {
            report.info(format!("Would delete branch '{}'", worktree.branch));
        } else if options.delete_branch {
            report.info("Detached HEAD; no branch would be deleted");
        }
        return Ok(());
    }

    remove_worktree(context, &worktree.path, options.force)?;
    report.info(format!("Removed worktree {}", worktree.path.display()));

    if delete {
        delete_branch(context, &worktree.branch, options.force)?;
        report.info(format!("Deleted branch '{}'", worktree.branch));
    } else if options.delete_branch {
        report.info("Detached HEAD; no branch to delete");
    }
    Ok(())
}
