use super::worktree_manager::{branch_exists, symbolic_ref, RepoContext};
use crate::error::{Result, WorktreeError};

pub const MAIN_BRANCHES: &[&str] = &["main", "master"];

/// Remotes whose `HEAD` symref names the base, in naming preference order.
const BASE_REMOTES: &[&str] = &["origin", "upstream"];

/// Pick the base branch: explicit override, `origin/HEAD`, `upstream/HEAD`,
/// the repository's own `HEAD` (only when `allow_head`), then `main` / `master`.
pub fn resolve_base_branch(
    context: &RepoContext,
    explicit: Option<&str>,
    allow_head: bool,
) -> Result<String> {
    if let Some(base) = explicit.map(str::trim).filter(|b| !b.is_empty()) {
        return Ok(base.to_string());
    }

    for remote in BASE_REMOTES {
        if let Some(target) = symbolic_ref(context, &format!("refs/remotes/{}/HEAD", remote)) {
            let target = target.strip_prefix("refs/remotes/").unwrap_or(&target);
            let name = target
                .strip_prefix(&format!("{}/", remote))
                .unwrap_or(target);
            log::debug!("base branch from {}/HEAD: {}", remote, name);
            return Ok(format!("{}/{}", remote, name));
        }
    }

    if allow_head {
        if let Some(head) = symbolic_ref(context, "HEAD") {
            let head = head.strip_prefix("refs/heads/").unwrap_or(&head).to_string();
            log::debug!("base branch from HEAD: {}", head);
            return Ok(head);
        }
    }

    for candidate in MAIN_BRANCHES {
        if branch_exists(context, candidate) {
            return Ok(candidate.to_string());
        }
    }

    Err(WorktreeError::AmbiguousBaseBranch)
}

/// `origin/main` -> `main` when `origin` is one of `remotes`; other names pass through.
pub fn strip_remote_prefix<'a>(base: &'a str, remotes: &[String]) -> &'a str {
    remotes
        .iter()
        .find_map(|r| base.strip_prefix(r.as_str()).and_then(|rest| rest.strip_prefix('/')))
        .unwrap_or(base)
}
