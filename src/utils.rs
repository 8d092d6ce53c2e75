use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WorktreeError};

// ============================================================================
// Configuration
// ============================================================================

/// Get the path to the gmc config directory (~/.config/gmc).
pub fn get_config_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".config").join("gmc")
    } else {
        PathBuf::from(".config").join("gmc")
    }
}

/// Get the path to the gmc config file (~/.config/gmc/config.json).
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(rename = "gitBinary", default = "default_git_binary")]
    pub git_binary: String,
    #[serde(default)]
    pub verbose: bool,
}

fn default_git_binary() -> String {
    "git".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            git_binary: default_git_binary(),
            verbose: false,
        }
    }
}

/// Read user settings; a missing or unreadable file yields defaults.
pub fn read_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed settings at {}: {}", path.display(), e);
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn read_settings() -> Settings {
    read_settings_from(&get_config_path())
}

// ============================================================================
// Validation
// ============================================================================

/// Reject names git would refuse or that could escape the project directory.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| WorktreeError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("name cannot start with '-'"));
    }
    if name.contains("..") {
        return Err(invalid("name cannot contain '..'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\'))
    {
        return Err(invalid(&format!("name cannot contain '{}'", c)));
    }
    Ok(())
}

pub fn parse_pr_number(input: &str) -> Result<u64> {
    let re = Regex::new(r"^\d+$").map_err(|e| WorktreeError::InvalidPrNumber(e.to_string()))?;
    let trimmed = input.trim().trim_start_matches('#');
    if !re.is_match(trimmed) {
        return Err(WorktreeError::InvalidPrNumber(input.to_string()));
    }
    match trimmed.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(WorktreeError::InvalidPrNumber(input.to_string())),
    }
}

// ============================================================================
// Formatting
// ============================================================================

pub fn format_path_with_tilde(file_path: &str) -> String {
    if let Some(home_dir) = dirs::home_dir() {
        let home_str = home_dir.to_string_lossy().to_string();
        if file_path.starts_with(&home_str) {
            // Only replace if the path is exactly homeDir or followed by a path separator
            if file_path == home_str || file_path.as_bytes().get(home_str.len()) == Some(&b'/') {
                return file_path.replacen(&home_str, "~", 1);
            }
        }
    }
    file_path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // --- branch name validation ---

    #[test]
    fn rejects_empty_name() {
        assert!(validate_branch_name("").is_err());
    }

    #[test]
    fn rejects_leading_dash() {
        assert!(validate_branch_name("-leading").is_err());
    }

    #[test]
    fn rejects_double_dots() {
        assert!(validate_branch_name("a..b").is_err());
        assert!(validate_branch_name("../escape").is_err());
    }

    #[test]
    fn rejects_forbidden_characters() {
        for name in [
            "has space", "tilde~1", "caret^", "co:lon", "what?", "star*", "br[acket", "back\\slash",
        ] {
            assert!(validate_branch_name(name).is_err(), "{} should be rejected", name);
        }
    }

    #[test]
    fn accepts_nested_names() {
        assert!(validate_branch_name("feature/login").is_ok());
        assert!(validate_branch_name("fix-123").is_ok());
        assert!(validate_branch_name("_dup/main/1700000000-1").is_ok());
    }

    #[test]
    fn error_names_the_branch() {
        let err = validate_branch_name("a b").unwrap_err();
        assert!(err.to_string().contains("'a b'"));
    }

    // --- PR number parsing ---

    #[test]
    fn pr_number_valid() {
        assert_eq!(parse_pr_number("123").unwrap(), 123);
        assert_eq!(parse_pr_number("#42").unwrap(), 42);
    }

    #[test]
    fn pr_number_command_injection() {
        assert!(parse_pr_number("123; rm -rf /").is_err());
        assert!(parse_pr_number("$(whoami)").is_err());
    }

    #[test]
    fn pr_number_non_numeric_or_zero() {
        assert!(parse_pr_number("abc").is_err());
        assert!(parse_pr_number("-123").is_err());
        assert!(parse_pr_number("0").is_err());
    }

    // --- settings ---

    #[test]
    fn missing_settings_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = read_settings_from(&tmp.path().join("config.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.git_binary, "git");
    }

    #[test]
    fn partial_settings_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"verbose": true}"#).unwrap();
        let settings = read_settings_from(&path);
        assert!(settings.verbose);
        assert_eq!(settings.git_binary, "git");
    }

    #[test]
    fn format_path_with_tilde_not_in_home() {
        assert_eq!(format_path_with_tilde("/tmp/projects/gmc"), "/tmp/projects/gmc");
    }
}
