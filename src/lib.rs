//! Bare-repository worktree management: one `.bare` object store with
//! linked working directories beside it.

pub mod commands;
pub mod error;
pub mod git;
pub mod models;
pub mod report;
pub mod shared;
pub mod utils;

pub use error::{Result, WorktreeError};
pub use git::{GitRunner, RepoContext, SystemGit};
pub use report::{Event, Level, Report};
