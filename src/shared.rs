//! Files and directories mirrored from the project root into worktrees.
//!
//! The set of resources lives in `.gmc-shared.yml` at the project root. Each
//! entry is replicated either as a copy or as a relative symlink, and an
//! existing destination is never overwritten.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, WorktreeError};
use crate::git::{list_worktrees, RepoContext, BARE_DIR};
use crate::report::Report;

/// Config file candidates in priority order (first match wins).
pub const SHARED_CONFIG_FILES: &[&str] = &[".gmc-shared.yml", ".gmc-shared.yaml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    Copy,
    Link,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Copy => "copy",
            SyncStrategy::Link => "link",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "copy" => Some(SyncStrategy::Copy),
            "link" => Some(SyncStrategy::Link),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured resource. The strategy is kept as written so an unknown
/// value is reported against the resource that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedResource {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub resources: Vec<SharedResource>,
}

impl SharedConfig {
    /// Update the strategy in place when `path` is already configured, else append.
    pub fn upsert(&mut self, path: &str, strategy: SyncStrategy) {
        match self.resources.iter_mut().find(|r| r.path == path) {
            Some(existing) => existing.strategy = strategy.to_string(),
            None => self.resources.push(SharedResource {
                path: path.to_string(),
                strategy: strategy.to_string(),
            }),
        }
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r.path != path);
        self.resources.len() != before
    }
}

pub fn find_shared_config(project_root: &Path) -> Option<PathBuf> {
    SHARED_CONFIG_FILES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| path.is_file())
}

/// Load the shared config. A missing file is an empty config.
pub fn load_shared_config(project_root: &Path) -> Result<SharedConfig> {
    let Some(path) = find_shared_config(project_root) else {
        return Ok(SharedConfig::default());
    };
    let content = fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(SharedConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Write the config back to the file it came from, or `.gmc-shared.yml`.
pub fn save_shared_config(project_root: &Path, config: &SharedConfig) -> Result<PathBuf> {
    let path = find_shared_config(project_root)
        .unwrap_or_else(|| project_root.join(SHARED_CONFIG_FILES[0]));
    let content = serde_yaml::to_string(config)?;
    fs::write(&path, content)?;
    Ok(path)
}

fn normalize_resource_path(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(WorktreeError::InvalidSharedResource(
            "path cannot be empty".to_string(),
        ));
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        return Err(WorktreeError::InvalidSharedResource(format!(
            "'{}' must be relative to the project root",
            raw
        )));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(WorktreeError::InvalidSharedResource(format!(
            "'{}' cannot point outside the project",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

pub fn add_shared_resource(
    context: &RepoContext,
    path: &str,
    strategy: SyncStrategy,
    report: &mut Report,
) -> Result<()> {
    context.ensure_bare_layout()?;
    let path = normalize_resource_path(path)?;
    let mut config = load_shared_config(context.project_root())?;
    let existed = config.resources.iter().any(|r| r.path == path);
    config.upsert(&path, strategy);
    let file = save_shared_config(context.project_root(), &config)?;

    if existed {
        report.info(format!("Updated shared resource {} ({})", path, strategy));
    } else {
        report.info(format!("Added shared resource {} ({})", path, strategy));
    }
    log::debug!("shared config written to {}", file.display());
    Ok(())
}

pub fn remove_shared_resource(context: &RepoContext, path: &str, report: &mut Report) -> Result<()> {
    context.ensure_bare_layout()?;
    let normalized = normalize_resource_path(path)?;
    let mut config = load_shared_config(context.project_root())?;
    if !config.remove(&normalized) {
        return Err(WorktreeError::SharedResourceNotFound {
            path: path.to_string(),
        });
    }
    save_shared_config(context.project_root(), &config)?;
    report.info(format!("Removed shared resource {}", normalized));
    Ok(())
}

pub fn list_shared_resources(context: &RepoContext) -> Result<Vec<SharedResource>> {
    Ok(load_shared_config(context.project_root())?.resources)
}

/// Worktree directory names under the project root, excluding the bare store.
fn worktree_names(context: &RepoContext) -> Result<HashSet<String>> {
    Ok(list_worktrees(context)?
        .iter()
        .filter(|wt| !wt.is_bare)
        .filter_map(|wt| context.relative_name(&wt.path))
        .filter(|name| name != BARE_DIR)
        .collect())
}

/// Replicate every configured resource into the worktree called `target`.
pub fn sync_shared_resources(context: &RepoContext, target: &str, report: &mut Report) -> Result<()> {
    let config = load_shared_config(context.project_root())?;
    if config.resources.is_empty() {
        return Ok(());
    }
    context.ensure_bare_layout()?;

    let target_dir = context.worktree_path(target);
    if !target_dir.is_dir() {
        return Err(WorktreeError::WorktreeNotFound {
            name: target.to_string(),
        });
    }

    let names = worktree_names(context)?;
    sync_into(
        context.project_root(),
        target,
        &target_dir,
        &config,
        &names,
        report,
    )
}

/// Sync into every worktree, turning per-worktree failures into warnings.
pub fn sync_all_shared_resources(context: &RepoContext, report: &mut Report) -> Result<()> {
    let config = load_shared_config(context.project_root())?;
    if config.resources.is_empty() {
        report.info("No shared resources configured.");
        return Ok(());
    }
    context.ensure_bare_layout()?;

    let names = worktree_names(context)?;
    let mut targets: Vec<&String> = names.iter().collect();
    targets.sort();

    for target in targets {
        let target_dir = context.worktree_path(target);
        let mut sub = Report::new();
        let result = sync_into(
            context.project_root(),
            target,
            &target_dir,
            &config,
            &names,
            &mut sub,
        );
        report.merge(sub);
        if let Err(e) = result {
            report.warn(format!(
                "Failed to sync shared resources into {}: {}",
                target, e
            ));
        }
    }
    Ok(())
}

fn sync_into(
    project_root: &Path,
    target: &str,
    target_dir: &Path,
    config: &SharedConfig,
    worktree_names: &HashSet<String>,
    report: &mut Report,
) -> Result<()> {
    for resource in &config.resources {
        if resource.path.trim().is_empty() || resource.strategy.trim().is_empty() {
            return Err(WorktreeError::InvalidSharedResource(format!(
                "entry {:?} needs both a path and a strategy",
                resource.path
            )));
        }
        let strategy = SyncStrategy::parse(&resource.strategy).ok_or_else(|| {
            WorktreeError::UnknownSyncStrategy {
                path: resource.path.clone(),
                strategy: resource.strategy.clone(),
            }
        })?;
        let rel = normalize_resource_path(&resource.path)?;

        // A leading segment naming another worktree selects that worktree as the source.
        let first = rel.split('/').next().unwrap_or_default();
        let logical = if first != BARE_DIR && worktree_names.contains(first) {
            if first == target {
                log::debug!("skipping {}: source is the target worktree", rel);
                continue;
            }
            let rest = rel[first.len()..].trim_start_matches('/');
            if rest.is_empty() {
                log::debug!("skipping {}: names a whole worktree", rel);
                continue;
            }
            rest.to_string()
        } else {
            rel.clone()
        };

        let source = project_root.join(&rel);
        if fs::symlink_metadata(&source).is_err() {
            log::debug!("skipping {}: source does not exist", rel);
            continue;
        }

        let dest = target_dir.join(&logical);
        if fs::symlink_metadata(&dest).is_ok() {
            log::debug!("skipping {}: destination already exists", dest.display());
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        match strategy {
            SyncStrategy::Link => {
                let parent = dest.parent().unwrap_or(target_dir);
                let link_target =
                    pathdiff::diff_paths(&source, parent).unwrap_or_else(|| source.clone());
                create_symlink(&link_target, &source, &dest)?;
                report.info(format!(
                    "Linked {} -> {} in {}",
                    logical,
                    link_target.display(),
                    target
                ));
            }
            SyncStrategy::Copy => {
                if source.is_dir() {
                    copy_dir_recursive(&source, &dest)?;
                } else {
                    fs::copy(&source, &dest)?;
                }
                report.info(format!("Copied {} into {}", logical, target));
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(link_target: &Path, _source: &Path, dest: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link_target, dest)?;
    Ok(())
}

#[cfg(windows)]
fn create_symlink(link_target: &Path, source: &Path, dest: &Path) -> Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(link_target, dest)?;
    } else {
        std::os::windows::fs::symlink_file(link_target, dest)?;
    }
    Ok(())
}

/// Copy a directory tree, keeping permission bits and symlinks.
fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_symlink() {
            let target = fs::read_link(&src_path)?;
            create_symlink(&target, &src_path, &dest_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }

    fs::set_permissions(dest, fs::metadata(src)?.permissions())?;
    Ok(())
}
