use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorktreeError {
    #[error("Not a git repository: {}", path.display())]
    NotAGitRepository { path: PathBuf },

    #[error("No .bare directory found above {}", start.display())]
    NoBareRootFound { start: PathBuf },

    #[error("Could not determine base branch; specify explicitly.")]
    AmbiguousBaseBranch,

    #[error("No remote configured (expected 'upstream' or 'origin')")]
    NoRemoteConfigured,

    #[error("Remote branch not found: {remote_ref}")]
    RemoteRefNotFound { remote_ref: String },

    #[error("Branch '{branch}' cannot be fast-forwarded to {remote_ref}")]
    NonFastForwardable { branch: String, remote_ref: String },

    #[error("Directory already exists: {}", path.display())]
    DirectoryAlreadyExists { path: PathBuf },

    #[error("Invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },

    #[error("Worktree '{name}' not found")]
    WorktreeNotFound { name: String },

    #[error("Cannot remove the bare repository entry")]
    CannotRemoveBareWorktree,

    #[error("Worktree {} is locked", path.display())]
    WorktreeLocked { path: PathBuf },

    #[error("Worktree {} has uncommitted changes", path.display())]
    WorktreeDirty { path: PathBuf },

    #[error("Worktree {} is in detached HEAD state", path.display())]
    WorktreeDetached { path: PathBuf },

    #[error("Unknown sync strategy '{strategy}' for shared resource '{path}'")]
    UnknownSyncStrategy { path: String, strategy: String },

    #[error("Invalid shared resource: {0}")]
    InvalidSharedResource(String),

    #[error("Shared resource '{path}' is not configured")]
    SharedResourceNotFound { path: String },

    #[error("Pull request #{number} not found on remote '{remote}'")]
    PrNotFound { number: u64, remote: String },

    #[error("Invalid PR number: {0}")]
    InvalidPrNumber(String),

    #[error("Cannot choose a remote automatically (found: {}); specify one explicitly", remotes.join(", "))]
    AmbiguousRemote { remotes: Vec<String> },

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shared config error: {0}")]
    SharedConfig(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WorktreeError>;
