use std::io;
use std::path::Path;
use std::process::Command;

/// Captured result of one backend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stderr when it says something, else the exit status.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// The single seam through which the core talks to git.
pub trait GitRunner {
    fn output(&self, dir: &Path, args: &[&str]) -> io::Result<GitOutput>;
}

pub struct SystemGit {
    binary: String,
    verbose: bool,
}

impl SystemGit {
    pub fn new(binary: impl Into<String>, verbose: bool) -> Self {
        Self {
            binary: binary.into(),
            verbose,
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new("git", false)
    }
}

impl GitRunner for SystemGit {
    fn output(&self, dir: &Path, args: &[&str]) -> io::Result<GitOutput> {
        if self.verbose {
            log::info!("$ {} -C {} {}", self.binary, dir.display(), args.join(" "));
        } else {
            log::debug!("$ {} -C {} {}", self.binary, dir.display(), args.join(" "));
        }

        let output = Command::new(&self.binary)
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()?;

        let result = GitOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        };
        if !result.success() {
            log::debug!("  ! {}", result.failure_message());
        }
        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_prefers_stderr() {
        let output = GitOutput {
            stdout: String::new(),
            stderr: "fatal: not a git repository\n".to_string(),
            code: Some(128),
        };
        assert_eq!(output.failure_message(), "fatal: not a git repository");
    }

    #[test]
    fn failure_message_falls_back_to_status() {
        let output = GitOutput {
            code: Some(1),
            ..Default::default()
        };
        assert_eq!(output.failure_message(), "exited with status 1");
    }
}
