use colored::Colorize;

use crate::error::Result;
use crate::git::{list_worktrees, RepoContext};
use crate::models::WorktreeRecord;
use crate::utils::format_path_with_tilde;

/// Fresh snapshot of every worktree, bare entry included.
pub fn run(context: &RepoContext) -> Result<Vec<WorktreeRecord>> {
    list_worktrees(context)
}

pub fn render_json(worktrees: &[WorktreeRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(worktrees)
}

/// One line per worktree: path, branch with lock/prunable markers, short hash.
pub fn render_text(worktrees: &[WorktreeRecord]) -> Vec<String> {
    let visible: Vec<&WorktreeRecord> = worktrees.iter().filter(|wt| !wt.is_bare).collect();
    if visible.is_empty() {
        return vec!["No worktrees found.".yellow().to_string()];
    }

    let paths: Vec<String> = visible
        .iter()
        .map(|wt| format_path_with_tilde(&wt.path.to_string_lossy()))
        .collect();
    let path_width = paths.iter().map(|p| p.len()).max().unwrap_or(0);

    visible
        .iter()
        .zip(paths)
        .map(|(wt, path)| {
            let mut symbols = String::new();
            if wt.is_locked {
                symbols.push_str(" 🔒");
            }
            if wt.is_prunable {
                symbols.push_str(" ⚠");
            }
            let branch = if wt.is_detached() {
                format!("[{}]", wt.branch).yellow().to_string()
            } else {
                format!("[{}]", wt.branch).green().to_string()
            };
            let spacing = " ".repeat(path_width.saturating_sub(path.len()));
            format!(
                "{}{}  {}{}  {}",
                path,
                spacing,
                branch,
                symbols,
                wt.short_commit().dimmed()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(path: &str, branch: &str) -> WorktreeRecord {
        WorktreeRecord {
            path: PathBuf::from(path),
            branch: branch.to_string(),
            commit: "abc123def4567890".to_string(),
            is_bare: false,
            is_locked: false,
            is_prunable: false,
        }
    }

    #[test]
    fn text_hides_bare_entry() {
        colored::control::set_override(false);
        let mut bare = record("/p/.bare", "");
        bare.is_bare = true;
        let mut locked = record("/p/feature", "feature");
        locked.is_locked = true;

        let lines = render_text(&[bare, record("/p/main", "main"), locked]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("/p/main"));
        assert!(lines[0].contains("[main]"));
        assert!(lines[0].ends_with("abc123de"));
        assert!(lines[1].contains("🔒"));
    }

    #[test]
    fn json_uses_camel_case_flags() {
        let json = render_json(&[record("/p/main", "main")]).unwrap();
        assert!(json.contains("\"isLocked\": false"));
        assert!(json.contains("\"branch\": \"main\""));
    }
}
