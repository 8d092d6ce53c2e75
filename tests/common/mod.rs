#![allow(dead_code)]

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use gmc::git::{RepoContext, SystemGit};

/// Run git in `dir` with a fixed identity, failing the test on a non-zero exit.
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn commit_file(dir: &Path, file: &str, content: &str, message: &str) -> Result<String> {
    fs::write(dir.join(file), content)?;
    git(dir, &["add", file])?;
    git(dir, &["commit", "-q", "-m", message])?;
    git(dir, &["rev-parse", "HEAD"])
}

/// A bare `origin`, a scratch clone that pushes to it, and a project laid out as
/// `<project>/.bare` plus a `main` worktree.
pub struct Fixture {
    _tmp: TempDir,
    pub origin: PathBuf,
    pub scratch: PathBuf,
    pub project: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let tmp = TempDir::new()?;
        let base = fs::canonicalize(tmp.path())?;
        let origin = base.join("origin.git");
        let scratch = base.join("scratch");
        let project = base.join("project");

        git(&base, &["init", "-q", "--bare", "-b", "main", "origin.git"])?;
        git(&base, &["clone", "-q", "origin.git", "scratch"])?;
        git(&scratch, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        commit_file(&scratch, "README.md", "# demo\n", "initial")?;
        git(&scratch, &["push", "-q", "origin", "main"])?;

        fs::create_dir_all(&project)?;
        let bare = project.join(".bare");
        git(
            &project,
            &["clone", "-q", "--bare", &origin.to_string_lossy(), ".bare"],
        )?;
        git(
            &bare,
            &["config", "remote.origin.fetch", "+refs/heads/*:refs/remotes/origin/*"],
        )?;
        git(&bare, &["fetch", "-q", "origin"])?;
        git(
            &bare,
            &["symbolic-ref", "refs/remotes/origin/HEAD", "refs/remotes/origin/main"],
        )?;
        git(
            &bare,
            &["worktree", "add", "-q", &project.join("main").to_string_lossy(), "main"],
        )?;

        Ok(Self {
            _tmp: tmp,
            origin,
            scratch,
            project,
        })
    }

    pub fn context(&self) -> Result<RepoContext> {
        Ok(RepoContext::discover(
            Box::new(SystemGit::default()),
            &self.project,
        )?)
    }

    pub fn worktree(&self, name: &str) -> PathBuf {
        self.project.join(name)
    }

    /// Commit in the scratch clone and push it to `origin`.
    pub fn push_upstream_commit(&self, file: &str, content: &str) -> Result<String> {
        let hash = commit_file(&self.scratch, file, content, "upstream change")?;
        git(&self.scratch, &["push", "-q", "origin", "main"])?;
        Ok(hash)
    }
}
