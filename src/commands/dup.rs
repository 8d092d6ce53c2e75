use chrono::Utc;

use super::sync_shared_best_effort;
use crate::error::{Result, WorktreeError};
use crate::git::{add_worktree, symbolic_ref, RepoContext};
use crate::models::{DupOptions, DupResult};
use crate::report::Report;
use crate::utils::validate_branch_name;

const DEFAULT_DUP_COUNT: usize = 2;

pub fn dup_dir_name(index: usize) -> String {
    format!(".dup-{}", index)
}

pub fn dup_branch_name(base: &str, timestamp: i64, index: usize) -> String {
    format!("_dup/{}/{}-{}", base, timestamp, index)
}

/// Create a cohort of `.dup-N` worktrees on fresh branches sharing one base and timestamp.
pub fn run(context: &RepoContext, options: &DupOptions, report: &mut Report) -> Result<DupResult> {
    context.ensure_bare_layout()?;
    create_cohort(context, options, Utc::now().timestamp(), report)
}

fn create_cohort(
    context: &RepoContext,
    options: &DupOptions,
    timestamp: i64,
    report: &mut Report,
) -> Result<DupResult> {
    let count = if options.count < 1 {
        DEFAULT_DUP_COUNT
    } else {
        options.count
    };

    let base = options
        .base_branch
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or("HEAD")
        .to_string();
    let base_label = if base == "HEAD" {
        symbolic_ref(context, "HEAD").unwrap_or_else(|| base.clone())
    } else {
        base.clone()
    };

    for index in 1..=count {
        let path = context.worktree_path(&dup_dir_name(index));
        if path.exists() {
            return Err(WorktreeError::DirectoryAlreadyExists { path });
        }
    }

    let mut result = DupResult::default();

    for index in 1..=count {
        let name = dup_dir_name(index);
        let branch = dup_branch_name(&base_label, timestamp, index);
        validate_branch_name(&branch)?;

        let path = context.worktree_path(&name);
        if path.exists() {
            return Err(WorktreeError::DirectoryAlreadyExists { path });
        }

        add_worktree(context, &path, &branch, Some(&base))?;
        report.info(format!("Created {} on branch {}", path.display(), branch));

        if let Some(warning) = sync_shared_best_effort(context, &name, report) {
            result.warnings.push(warning);
        }
        result.worktrees.push(path);
        result.branches.push(branch);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context_at;
    use crate::git::runner::mock::{called, MockGit};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn names_are_cohort_shaped() {
        assert_eq!(dup_dir_name(3), ".dup-3");
        assert_eq!(dup_branch_name("main", 1700000000, 2), "_dup/main/1700000000-2");
    }

    #[test]
    fn collision_aborts_before_creating_anything() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".bare")).unwrap();
        fs::create_dir_all(tmp.path().join(".dup-2")).unwrap();
        let git = MockGit::new().ok("symbolic-ref --quiet --short HEAD", "main\n");
        let ctx = context_at(tmp.path(), git);

        let result = run(&ctx, &DupOptions::default(), &mut Report::new());
        assert!(matches!(result, Err(WorktreeError::DirectoryAlreadyExists { .. })));
    }

    #[test]
    fn plain_checkout_is_refused() {
        let tmp = TempDir::new().unwrap();
        let git = MockGit::new();
        let journal = git.journal();
        let ctx = context_at(tmp.path(), git);

        let result = run(&ctx, &DupOptions::default(), &mut Report::new());
        assert!(matches!(result, Err(WorktreeError::NoBareRootFound { .. })));
        assert!(journal.borrow().is_empty());
        assert!(!tmp.path().join(".dup-1").exists());
    }

    #[test]
    fn zero_count_creates_two_on_one_cohort() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let git = MockGit::new()
            .ok("symbolic-ref --quiet --short HEAD", "main\n")
            .ok(
                &format!("worktree add -b _dup/main/1700000000-1 {} HEAD", root.join(".dup-1").display()),
                "",
            )
            .ok(
                &format!("worktree add -b _dup/main/1700000000-2 {} HEAD", root.join(".dup-2").display()),
                "",
            );
        let ctx = context_at(root, git);

        let options = DupOptions {
            base_branch: None,
            count: 0,
        };
        let result = create_cohort(&ctx, &options, 1700000000, &mut Report::new()).unwrap();
        assert_eq!(
            result.branches,
            vec!["_dup/main/1700000000-1", "_dup/main/1700000000-2"]
        );
        assert_eq!(result.worktrees, vec![root.join(".dup-1"), root.join(".dup-2")]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn explicit_base_names_the_branches() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let git = MockGit::new().ok(
            &format!(
                "worktree add -b _dup/origin/main/42-1 {} origin/main",
                root.join(".dup-1").display()
            ),
            "",
        );
        let journal = git.journal();
        let ctx = context_at(root, git);

        let options = DupOptions {
            base_branch: Some("origin/main".to_string()),
            count: 1,
        };
        let result = create_cohort(&ctx, &options, 42, &mut Report::new()).unwrap();
        assert_eq!(result.branches, vec!["_dup/origin/main/42-1"]);
        assert!(!called(&journal, "symbolic-ref"));
    }

    #[test]
    fn shared_sync_failure_is_collected_per_worktree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join(".gmc-shared.yml"), "resources: [not, a, mapping\n").unwrap();
        let git = MockGit::new().ok(
            &format!("worktree add -b _dup/dev/7-1 {} dev", root.join(".dup-1").display()),
            "",
        );
        let ctx = context_at(root, git);

        let options = DupOptions {
            base_branch: Some("dev".to_string()),
            count: 1,
        };
        let mut report = Report::new();
        let result = create_cohort(&ctx, &options, 7, &mut report).unwrap();
        assert_eq!(result.worktrees.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(report.warnings().count() == 1);
    }
}
