//! Git subprocess access.
//!
//! The pipeline only talks to git through the port traits below. [`SystemGit`] implements them
//! by running the `git` binary; tests substitute in-memory fakes.

mod commit;
mod history;
mod push;

pub use commit::{ensure_initial_commit, INITIAL_COMMIT_MESSAGE};
pub use history::{env_filter_script, BACKUP_REFS};
pub use push::PushEngine;

use crate::error::{MigrationError, Result};
use crate::types::Identity;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// The remote every operation targets.
pub const ORIGIN: &str = "origin";

/// Decode subprocess output, replacing invalid UTF-8 sequences with U+FFFD.
pub fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Exit status and decoded combined output of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    /// Exit status was zero.
    pub success: bool,
    /// Stdout followed by stderr.
    pub output: String,
}

impl GitOutput {
    /// A successful invocation.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// A failed invocation.
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Rewrites commit authorship across all branches and tags.
pub trait HistoryRewritePort {
    /// Rewrite author and committer of every commit that does not already match `identity`.
    fn rewrite_history(&self, repo: &Path, identity: &Identity) -> Result<()>;
}

/// Reads and writes the `origin` URL.
pub trait RemotePort {
    /// The `origin` URL, or `None` when no such remote is configured.
    fn remote_url(&self, repo: &Path) -> Result<Option<String>>;

    /// Replace the `origin` URL.
    fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()>;
}

/// Runs `git push`.
pub trait PushPort: RemotePort {
    /// Run `git push <args>`. An unsuccessful exit is reported in the output, not as `Err`.
    fn push(&self, repo: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// Local branch and commit queries used before pushing.
pub trait WorkingCopyPort {
    /// The checked-out branch name (empty when detached).
    fn current_branch(&self, repo: &Path) -> Result<String>;

    /// Whether `HEAD` points at a commit.
    fn has_commits(&self, repo: &Path) -> Result<bool>;

    /// `git add .`
    fn stage_all(&self, repo: &Path) -> Result<()>;

    /// Whether the index differs from `HEAD`.
    fn has_staged_changes(&self, repo: &Path) -> Result<bool>;

    /// Commit the index as `identity`.
    fn commit(&self, repo: &Path, identity: &Identity, message: &str, allow_empty: bool)
        -> Result<()>;
}

/// Port implementation backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: PathBuf,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGit {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn command(&self, repo: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.current_dir(repo);
        command
    }

    /// Run git with `args` and capture combined output.
    pub fn run(&self, repo: &Path, args: &[&str]) -> Result<GitOutput> {
        let output = self.command(repo).args(args).output()?;
        let mut text = decode_output(&output.stdout);
        text.push_str(&decode_output(&output.stderr));

        debug!(
            repo = %repo.display(),
            command = %args.first().copied().unwrap_or_default(),
            success = output.status.success(),
            "git"
        );

        Ok(GitOutput {
            success: output.status.success(),
            output: text,
        })
    }

    /// Run git and fail with [`MigrationError::GitCommandFailed`] on a non-zero exit.
    pub fn run_checked(&self, repo: &Path, args: &[&str]) -> Result<String> {
        let output = self.run(repo, args)?;
        if output.success {
            Ok(output.output)
        } else {
            Err(MigrationError::GitCommandFailed {
                command: args.join(" "),
                output: output.output,
            })
        }
    }

    /// `git init`
    pub fn init(&self, repo: &Path) -> Result<()> {
        self.run_checked(repo, &["init"]).map(drop)
    }

    /// `git remote add origin <url>`
    pub fn add_remote(&self, repo: &Path, url: &str) -> Result<()> {
        self.run_checked(repo, &["remote", "add", ORIGIN, url])
            .map(drop)
    }
}

impl RemotePort for SystemGit {
    fn remote_url(&self, repo: &Path) -> Result<Option<String>> {
        let output = self.run(repo, &["remote", "get-url", ORIGIN])?;
        if output.success {
            Ok(Some(output.output.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()> {
        let output = self.run(repo, &["remote", "set-url", ORIGIN, url])?;
        if output.success {
            Ok(())
        } else {
            Err(MigrationError::RemoteUrlUpdateFailed(output.output))
        }
    }
}

impl PushPort for SystemGit {
    fn push(&self, repo: &Path, args: &[&str]) -> Result<GitOutput> {
        let mut full = vec!["push"];
        full.extend_from_slice(args);
        self.run(repo, &full)
    }
}

impl WorkingCopyPort for SystemGit {
    fn current_branch(&self, repo: &Path) -> Result<String> {
        self.run_checked(repo, &["branch", "--show-current"])
            .map(|out| out.trim().to_string())
    }

    fn has_commits(&self, repo: &Path) -> Result<bool> {
        Ok(self.run(repo, &["log", "--oneline", "-1"])?.success)
    }

    fn stage_all(&self, repo: &Path) -> Result<()> {
        self.run_checked(repo, &["add", "."]).map(drop)
    }

    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        // exit 0: index matches HEAD
        Ok(!self.run(repo, &["diff", "--cached", "--quiet"])?.success)
    }

    fn commit(
        &self,
        repo: &Path,
        identity: &Identity,
        message: &str,
        allow_empty: bool,
    ) -> Result<()> {
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        let mut args = vec!["-c", name.as_str(), "-c", email.as_str(), "commit"];
        if allow_empty {
            args.push("--allow-empty");
        }
        args.extend(["-m", message]);
        self.run_checked(repo, &args).map(drop)
    }
}
