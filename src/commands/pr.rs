use std::path::PathBuf;

use super::sync_shared_best_effort;
use crate::error::{Result, WorktreeError};
use crate::git::{add_worktree, fetch_refspec, list_remotes, remote_has_ref, short_hash, RepoContext};
use crate::report::Report;

pub fn pr_branch_name(number: u64) -> String {
    format!("pr-{}", number)
}

/// `upstream` first, then `origin`, then the only remote there is.
pub fn detect_pr_remote(remotes: &[String]) -> Result<String> {
    for preferred in ["upstream", "origin"] {
        if remotes.iter().any(|r| r == preferred) {
            return Ok(preferred.to_string());
        }
    }
    match remotes {
        [] => Err(WorktreeError::NoRemoteConfigured),
        [only] => Ok(only.clone()),
        _ => Err(WorktreeError::AmbiguousRemote {
            remotes: remotes.to_vec(),
        }),
    }
}

/// Check out pull request `number` into a `pr-<number>` worktree.
pub fn run(
    context: &RepoContext,
    number: u64,
    remote: Option<&str>,
    report: &mut Report,
) -> Result<PathBuf> {
    if number == 0 {
        return Err(WorktreeError::InvalidPrNumber(number.to_string()));
    }
    context.ensure_bare_layout()?;

    let remote = match remote.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => r.to_string(),
        None => detect_pr_remote(&list_remotes(context)?)?,
    };

    let branch = pr_branch_name(number);
    let path = context.worktree_path(&branch);
    if path.exists() {
        return Err(WorktreeError::DirectoryAlreadyExists { path });
    }

    let pull_ref = format!("refs/pull/{}/head", number);
    if !remote_has_ref(context, &remote, &pull_ref)? {
        return Err(WorktreeError::PrNotFound { number, remote });
    }

    fetch_refspec(context, &remote, &format!("+{}:{}", pull_ref, branch))?;
    report.info(format!("Fetched PR #{} from {} into '{}'", number, remote, branch));

    add_worktree(context, &path, &branch, None)?;
    sync_shared_best_effort(context, &branch, report);

    match short_hash(context, &branch) {
        Ok(hash) => report.info(format!("Created worktree at {} ({})", path.display(), hash)),
        Err(e) => {
            log::debug!("could not shorten {}: {}", branch, e);
            report.info(format!("Created worktree at {}", path.display()));
        }
    }
    Ok(path)
}
