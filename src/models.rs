use serde::Serialize;
use std::path::PathBuf;

pub const DETACHED: &str = "(detached)";

/// One entry of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeRecord {
    pub path: PathBuf,
    pub branch: String,
    pub commit: String,
    #[serde(rename = "isBare")]
    pub is_bare: bool,
    #[serde(rename = "isLocked")]
    pub is_locked: bool,
    #[serde(rename = "isPrunable")]
    pub is_prunable: bool,
}

impl WorktreeRecord {
    pub fn is_detached(&self) -> bool {
        self.branch == DETACHED
    }

    pub fn short_commit(&self) -> &str {
        if self.commit.len() > 8 {
            &self.commit[..8]
        } else {
            &self.commit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoType {
    Normal,
    Bare,
    Worktree,
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub base_branch: Option<String>,
    pub fetch: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub force: bool,
    pub delete_branch: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub base_branch: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    pub base_branch: Option<String>,
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DupOptions {
    pub base_branch: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DupResult {
    pub worktrees: Vec<PathBuf>,
    pub branches: Vec<String>,
    pub warnings: Vec<String>,
}
