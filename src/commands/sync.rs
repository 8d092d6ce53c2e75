use crate::error::{Result, WorktreeError};
use crate::git::{
    fetch_remote, is_ancestor, is_dirty, list_remotes, list_worktrees, push_branch, reset_hard,
    resolve_base_branch, resolve_ref, strip_remote_prefix, update_ref, RepoContext,
};
use crate::models::SyncOptions;
use crate::report::Report;

/// In a fork workflow the authoritative base lives on `upstream`.
pub fn select_sync_remote(remotes: &[String]) -> Result<&'static str> {
    ["upstream", "origin"]
        .into_iter()
        .find(|candidate| remotes.iter().any(|r| r == candidate))
        .ok_or(WorktreeError::NoRemoteConfigured)
}

fn short(hash: &str) -> &str {
    if hash.len() > 8 {
        &hash[..8]
    } else {
        hash
    }
}

/// Fast-forward the base branch (and the worktree that has it checked out)
/// to the selected remote. Refuses anything that is not a fast-forward.
pub fn run(context: &RepoContext, options: &SyncOptions, report: &mut Report) -> Result<()> {
    let remotes = list_remotes(context)?;
    let remote = select_sync_remote(&remotes)?;

    let resolved = resolve_base_branch(context, options.base_branch.as_deref(), false)?;
    let base = strip_remote_prefix(&resolved, &remotes).to_string();
    let remote_ref = format!("{}/{}", remote, base);
    let local_full = format!("refs/heads/{}", base);
    let remote_full = format!("refs/remotes/{}", remote_ref);

    let worktrees = list_worktrees(context)?;
    let base_worktree = worktrees
        .iter()
        .find(|wt| !wt.is_bare && wt.branch == base);
    let dirty = match base_worktree {
        Some(wt) => is_dirty(context, &wt.path)?,
        None => false,
    };

    if options.dry_run {
        report.info(format!("Would fetch {}", remote));
    } else {
        fetch_remote(context, remote)?;
        report.info(format!("Fetched {}", remote));
    }

    let remote_hash = resolve_ref(context, &remote_full)?.ok_or_else(|| {
        WorktreeError::RemoteRefNotFound {
            remote_ref: remote_ref.clone(),
        }
    })?;
    let local_hash = resolve_ref(context, &local_full)?;

    if let Some(local) = local_hash.as_deref() {
        if local != remote_hash && !is_ancestor(context, local, &remote_hash)? {
            return Err(WorktreeError::NonFastForwardable {
                branch: base,
                remote_ref,
            });
        }
    }

    if local_hash.as_deref() == Some(remote_hash.as_str()) {
        report.info(format!("'{}' is already up to date with {}", base, remote_ref));
        return Ok(());
    }

    let range = match local_hash.as_deref() {
        Some(local) => format!("{}..{}", short(local), short(&remote_hash)),
        None => format!("new at {}", short(&remote_hash)),
    };

    match base_worktree {
        None => {
            if options.dry_run {
                report.info(format!("Would fast-forward '{}' ({})", base, range));
            } else {
                update_ref(context, &local_full, &remote_hash)?;
                report.info(format!("Fast-forwarded '{}' ({})", base, range));
            }
            report.warn(format!(
                "No worktree has '{}' checked out; only the branch ref is updated",
                base
            ));
        }
        Some(wt) if dirty => {
            report.warn(format!(
                "Worktree {} has uncommitted changes; skipping update of '{}'",
                wt.path.display(),
                base
            ));
            return Ok(());
        }
        Some(wt) => {
            if options.dry_run {
                report.info(format!("Would fast-forward '{}' ({})", base, range));
                report.info(format!("Would update worktree {}", wt.path.display()));
            } else {
                reset_hard(context, &wt.path, &remote_hash)?;
                report.info(format!("Fast-forwarded '{}' ({})", base, range));
                report.info(format!("Updated worktree {}", wt.path.display()));
            }
        }
    }

    if remote == "upstream" && remotes.iter().any(|r| r == "origin") {
        if options.dry_run {
            report.info(format!("Would push '{}' to origin", base));
        } else {
            match push_branch(context, "origin", &base) {
                Ok(()) => report.info(format!("Pushed '{}' to origin", base)),
                Err(e) => report.warn(format!("Failed to push '{}' to origin: {}", base, e)),
            }
        }
    }

    Ok(())
}
