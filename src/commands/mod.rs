pub mod add;
pub mod dup;
pub mod list;
pub mod pr;
pub mod promote;
pub mod prune;
pub mod remove;
pub mod sync;

use crate::git::RepoContext;
use crate::report::Report;
use crate::shared::sync_shared_resources;

/// Replicate shared resources into a freshly created worktree. Failures become
/// a warning on `report`, which is also returned to the caller.
pub(crate) fn sync_shared_best_effort(
    context: &RepoContext,
    target: &str,
    report: &mut Report,
) -> Option<String> {
    let mut sub = Report::new();
    let result = sync_shared_resources(context, target, &mut sub);
    report.merge(sub);
    match result {
        Ok(()) => None,
        Err(e) => {
            let warning = format!("Shared resource sync for {} failed: {}", target, e);
            report.warn(warning.clone());
            Some(warning)
        }
    }
}

fn status_label(dirty: bool) -> &'static str {
    if dirty {
        "dirty"
    } else {
        "clean"
    }
}
