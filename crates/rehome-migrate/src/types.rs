//! Common types for migration operations.

use crate::collaborators::{CollaboratorReport, CollaboratorSources};
use crate::error::MigrationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Authorship identity written into every rewritten commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Author and committer name.
    pub name: String,
    /// Author and committer email.
    pub email: String,
}

impl Identity {
    /// Create a new identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Inputs to target-owner resolution.
///
/// Built once at startup from flags and captured environment values; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipConfig {
    /// `--owner`: personal account, highest priority.
    pub explicit_owner: Option<String>,

    /// `--organization`.
    pub explicit_organization: Option<String>,

    /// The configured user (`--user`), used when nothing else is set.
    pub authenticated_user: String,

    /// `GITHUB_REPOSITORY_OWNER` captured at startup.
    pub env_repository_owner: Option<String>,

    /// `GITHUB_ORGANIZATION` captured at startup.
    pub env_organization: Option<String>,
}

impl OwnershipConfig {
    /// Create a configuration that falls back to `authenticated_user`.
    pub fn new(authenticated_user: impl Into<String>) -> Self {
        Self {
            authenticated_user: authenticated_user.into(),
            ..Default::default()
        }
    }

    /// Set the explicit personal owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.explicit_owner = Some(owner.into());
        self
    }

    /// Set the explicit organization.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.explicit_organization = Some(organization.into());
        self
    }

    /// Set the environment-sourced personal owner.
    pub fn with_env_owner(mut self, owner: impl Into<String>) -> Self {
        self.env_repository_owner = Some(owner.into());
        self
    }

    /// Set the environment-sourced organization.
    pub fn with_env_organization(mut self, organization: impl Into<String>) -> Self {
        self.env_organization = Some(organization.into());
        self
    }
}

/// Everything the pipeline needs, constructed once by the caller.
#[derive(Clone)]
pub struct RuntimeOptions {
    /// Identity applied to rewritten history and synthesized commits.
    pub identity: Identity,

    /// GitHub token used for pushes. `None` pushes with whatever credentials git already has.
    pub token: Option<String>,

    /// Ownership inputs.
    pub ownership: OwnershipConfig,

    /// Create missing repositories as private.
    pub private: bool,

    /// Push every branch and tag after the current branch.
    pub push_all: bool,

    /// Disable GitHub Actions around the push.
    pub toggle_actions: bool,

    /// Where collaborators for newly created repositories come from.
    pub collaborators: CollaboratorSources,
}

impl RuntimeOptions {
    /// Create options with the defaults: private repositories, current branch only,
    /// Actions toggling on.
    pub fn new(identity: Identity, ownership: OwnershipConfig) -> Self {
        Self {
            identity,
            token: None,
            ownership,
            private: true,
            push_all: false,
            toggle_actions: true,
            collaborators: CollaboratorSources::default(),
        }
    }

    /// Set the push token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create repositories as private or public.
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Enable or disable push-all.
    pub fn with_push_all(mut self, push_all: bool) -> Self {
        self.push_all = push_all;
        self
    }

    /// Enable or disable the Actions toggle.
    pub fn with_actions_toggle(mut self, toggle: bool) -> Self {
        self.toggle_actions = toggle;
        self
    }

    /// Set collaborator sources.
    pub fn with_collaborators(mut self, collaborators: CollaboratorSources) -> Self {
        self.collaborators = collaborators;
        self
    }
}

impl std::fmt::Debug for RuntimeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeOptions")
            .field("identity", &self.identity)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ownership", &self.ownership)
            .field("private", &self.private)
            .field("push_all", &self.push_all)
            .field("toggle_actions", &self.toggle_actions)
            .field("collaborators", &self.collaborators)
            .finish()
    }
}

/// Stages of the per-repository pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Found on disk, nothing done yet.
    Discovered,
    /// Authorship rewritten across all branches and tags.
    HistoryRewritten,
    /// Remote URL step finished (updated, skipped, or failed with a warning).
    RemoteUpdated,
    /// Remote verified, created if needed, and pushed.
    Pushed,
    /// All stages complete.
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovered => write!(f, "Discovered"),
            Self::HistoryRewritten => write!(f, "History rewritten"),
            Self::RemoteUpdated => write!(f, "Remote updated"),
            Self::Pushed => write!(f, "Verified and pushed"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Which report bucket a repository lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryOutcome {
    /// Every stage succeeded.
    Succeeded,
    /// History was rewritten but verification or push failed; re-run the push.
    PushFailed,
    /// History rewrite failed; re-run the whole repository.
    RewriteFailed,
}

/// Result of running the pipeline on one repository.
#[derive(Debug)]
pub struct PipelineResult {
    /// Repository working directory.
    pub repo_path: PathBuf,

    /// Stage 1 completed.
    pub history_rewritten: bool,

    /// Stage 3 completed.
    pub push_succeeded: bool,

    /// Furthest stage completed.
    pub stage: PipelineStage,

    /// The error that halted the pipeline, if any.
    pub error: Option<MigrationError>,

    /// Recovered failures (remote rewrite, Actions toggling, collaborators).
    pub warnings: Vec<String>,

    /// Collaborator attachment counts when the repository was created.
    pub collaborators: Option<CollaboratorReport>,
}

impl PipelineResult {
    /// Create a result for a freshly discovered repository.
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            history_rewritten: false,
            push_succeeded: false,
            stage: PipelineStage::Discovered,
            error: None,
            warnings: Vec::new(),
            collaborators: None,
        }
    }

    /// Record that a stage completed.
    pub fn advance(&mut self, stage: PipelineStage) {
        match stage {
            PipelineStage::HistoryRewritten => self.history_rewritten = true,
            PipelineStage::Pushed => self.push_succeeded = true,
            _ => {}
        }
        self.stage = stage;
    }

    /// Halt with an error.
    pub fn fail(mut self, error: MigrationError) -> Self {
        self.error = Some(error);
        self
    }

    /// Add a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Whether every stage succeeded.
    pub fn is_successful(&self) -> bool {
        self.history_rewritten && self.push_succeeded && self.error.is_none()
    }

    /// The report bucket for this repository.
    pub fn outcome(&self) -> RepositoryOutcome {
        if self.is_successful() {
            RepositoryOutcome::Succeeded
        } else if self.history_rewritten {
            RepositoryOutcome::PushFailed
        } else {
            RepositoryOutcome::RewriteFailed
        }
    }
}
