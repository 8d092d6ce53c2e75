pub mod base_branch;
pub mod runner;
pub mod topology;
pub mod worktree_manager;

pub use base_branch::{resolve_base_branch, strip_remote_prefix, MAIN_BRANCHES};
pub use runner::{GitOutput, GitRunner, SystemGit};
pub use topology::{
    detect_repository_type, find_bare_root, get_worktree_root, is_bare_worktree, BARE_DIR,
};
pub use worktree_manager::{
    add_worktree, branch_exists, delete_branch, fetch_all, fetch_refspec, fetch_remote,
    find_worktree, is_ancestor, is_dirty, list_remotes, list_worktrees, parse_worktree_lines,
    push_branch, remote_has_ref, remove_worktree, rename_branch, reset_hard, resolve_ref,
    short_hash, symbolic_ref, update_ref, RepoContext,
};
