//! Error types for migration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Migration-specific errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The directory has no `.git` subdirectory.
    #[error("{} is not a git repository", .0.display())]
    NotAGitRepository(PathBuf),

    /// The history rewrite subprocess (or its backup cleanup) failed.
    #[error("history rewrite failed: {0}")]
    RewriteExecutionFailed(String),

    /// `git remote set-url` failed.
    #[error("failed to update remote URL: {0}")]
    RemoteUrlUpdateFailed(String),

    /// No access token was configured.
    #[error("GitHub access token is not set")]
    MissingCredential,

    /// The repository could not be created on GitHub.
    #[error("repository creation failed: {0}")]
    CreationFailed(String),

    /// The target owner is another individual's personal account.
    #[error("cannot create a repository under another user's account '{0}'; check the organization name")]
    ForeignUserRepositoryDenied(String),

    /// A collaborator could not be attached.
    #[error("failed to add collaborator {username}: {reason}")]
    CollaboratorAddFailed {
        /// Collaborator login.
        username: String,
        /// Response status and body.
        reason: String,
    },

    /// Both the plain and the forced push failed.
    #[error("push of {refspec} failed after forced retry:\n{}", .attempts.join("\n---\n"))]
    PushFailed {
        /// What was being pushed (`HEAD`, `--all`, `--tags`).
        refspec: String,
        /// Diagnostic output of every attempt, in order.
        attempts: Vec<String>,
    },

    /// The `origin` URL does not point at the resolved owner.
    #[error("remote owner mismatch: expected {expected}, remote is {url}")]
    OwnerMismatch {
        /// Owner the pipeline resolved.
        expected: String,
        /// URL found on disk.
        url: String,
    },

    /// No `origin` remote is configured.
    #[error("remote 'origin' is not configured")]
    MissingRemote,

    /// The `origin` URL is not a recognised GitHub URL.
    #[error("cannot extract owner/repository from remote URL: {0}")]
    UnparseableRemote(String),

    /// A git subprocess exited unsuccessfully.
    #[error("git {command} failed: {output}")]
    GitCommandFailed {
        /// The git subcommand line.
        command: String,
        /// Decoded combined output.
        output: String,
    },

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl MigrationError {
    /// Whether the pipeline logs this error and carries on instead of halting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUrlUpdateFailed(_) | Self::CollaboratorAddFailed { .. }
        )
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;
