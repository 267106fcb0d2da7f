//! Per-repository migration pipeline.
//!
//! Stages run strictly in order and never go back:
//!
//! 1. rewrite history (failure ends the run for this repository)
//! 2. repoint `origin` at the resolved owner (failures become warnings)
//! 3. verify the remote, create the GitHub repository if needed, and push with Actions paused

use crate::error::{MigrationError, Result};
use crate::git::{ensure_initial_commit, HistoryRewritePort, PushEngine, PushPort, WorkingCopyPort};
use crate::github::HostingPort;
use crate::owner::ResolvedOwner;
use crate::progress::BatchProgress;
use crate::remote::{redact, rewrite_remote, RemoteRewrite, RemoteUrl};
use crate::types::{PipelineResult, PipelineStage, RuntimeOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs the migration stages for one repository at a time.
pub struct RepositoryPipeline<G, H> {
    git: G,
    hosting: H,
    options: RuntimeOptions,
    progress: Arc<BatchProgress>,
}

impl<G, H> RepositoryPipeline<G, H>
where
    G: HistoryRewritePort + PushPort + WorkingCopyPort,
    H: HostingPort,
{
    /// Create a pipeline.
    pub fn new(git: G, hosting: H, options: RuntimeOptions) -> Self {
        Self {
            git,
            hosting,
            options,
            progress: Arc::new(BatchProgress::new()),
        }
    }

    /// Report stage transitions to `progress`.
    pub fn with_progress(mut self, progress: Arc<BatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// The git port.
    pub fn git(&self) -> &G {
        &self.git
    }

    /// The hosting port.
    pub fn hosting(&self) -> &H {
        &self.hosting
    }

    /// The runtime options.
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// The progress tracker.
    pub fn progress(&self) -> &BatchProgress {
        &self.progress
    }

    /// Run every stage on `repo`. Never fails; the result records how far it got.
    pub async fn process(&self, repo: &Path) -> PipelineResult {
        let mut result = PipelineResult::new(repo);
        let name = display_name(repo);
        let owner = self.options.ownership.resolve();

        info!(repo = %name, owner = %owner, kind = %owner.kind(), "Processing repository");

        if let Err(e) = self.git.rewrite_history(repo, &self.options.identity) {
            error!(repo = %name, error = %e, "History rewrite failed");
            return result.fail(e);
        }
        self.advance(&mut result, &name, PipelineStage::HistoryRewritten);

        self.update_remote(repo, &owner, &mut result);
        self.advance(&mut result, &name, PipelineStage::RemoteUpdated);

        if let Err(e) = self.verify_and_push(repo, &owner, &mut result).await {
            error!(repo = %name, error = %e, "Verification or push failed");
            return result.fail(e);
        }
        self.advance(&mut result, &name, PipelineStage::Pushed);
        self.advance(&mut result, &name, PipelineStage::Done);

        info!(repo = %name, "Repository migrated");
        result
    }

    fn advance(&self, result: &mut PipelineResult, name: &str, stage: PipelineStage) {
        result.advance(stage);
        self.progress.stage(name, stage);
    }

    fn update_remote(&self, repo: &Path, owner: &ResolvedOwner, result: &mut PipelineResult) {
        match rewrite_remote(&self.git, repo, owner.as_str()) {
            Ok(RemoteRewrite::Unparseable(url)) => {
                result.add_warning(format!(
                    "origin URL {} is not a GitHub URL and was left unchanged",
                    redact(&url)
                ));
            }
            Ok(outcome) => debug!(?outcome, "Remote step finished"),
            Err(e) => {
                warn!(repo = %repo.display(), error = %e, "Remote URL update failed, continuing");
                result.add_warning(e.to_string());
            }
        }
    }

    async fn verify_and_push(
        &self,
        repo: &Path,
        owner: &ResolvedOwner,
        result: &mut PipelineResult,
    ) -> Result<()> {
        let url = self
            .git
            .remote_url(repo)?
            .ok_or(MigrationError::MissingRemote)?;
        let remote = RemoteUrl::parse(&url)
            .ok_or_else(|| MigrationError::UnparseableRemote(redact(&url)))?;

        if remote.owner != owner.as_str() {
            return Err(MigrationError::OwnerMismatch {
                expected: owner.to_string(),
                url: redact(&url),
            });
        }

        if !self
            .hosting
            .repository_exists(&remote.owner, &remote.repo)
            .await?
        {
            info!(owner = %remote.owner, repo = %remote.repo, "Repository not found on GitHub, creating");
            let collaborators = self.options.collaborators.collaborators_for(&remote.repo);
            let report = self
                .hosting
                .create_repository_with_collaborators(
                    &remote.owner,
                    &remote.repo,
                    self.options.private,
                    &collaborators,
                )
                .await?;

            for username in &report.failed {
                result.add_warning(format!("collaborator {username} could not be added"));
            }
            result.collaborators = Some(report);
        }

        match self.git.current_branch(repo) {
            Ok(branch) => info!(repo = %repo.display(), %branch, "Current branch"),
            Err(e) => debug!(error = %e, "Could not determine current branch"),
        }

        if ensure_initial_commit(&self.git, repo, &self.options.identity)? {
            info!(repo = %repo.display(), "Created initial commit");
        }

        if !self.options.toggle_actions {
            return self.push(repo);
        }

        let snapshot = match self.hosting.actions_enabled(&remote.owner, &remote.repo).await {
            Ok(enabled) => Some(enabled),
            Err(e) => {
                warn!(error = %e, "Could not read Actions state, will re-enable after push");
                None
            }
        };

        if let Err(e) = self
            .hosting
            .set_actions_enabled(&remote.owner, &remote.repo, false)
            .await
        {
            warn!(error = %e, "Could not disable Actions");
            result.add_warning(format!("failed to disable Actions: {e}"));
        }

        let pushed = self.push(repo);

        let restore = snapshot.unwrap_or(true);
        if let Err(e) = self
            .hosting
            .set_actions_enabled(&remote.owner, &remote.repo, restore)
            .await
        {
            warn!(error = %e, enabled = restore, "Could not restore Actions state");
            result.add_warning(format!("failed to restore Actions state: {e}"));
        }

        pushed
    }

    fn push(&self, repo: &Path) -> Result<()> {
        let engine = PushEngine::new(&self.git, self.options.token.as_deref());
        engine.push(repo, "HEAD")?;
        if self.options.push_all {
            engine.push_all(repo)?;
        }
        Ok(())
    }
}

/// Directory name used in logs and progress output.
pub fn display_name(repo: &Path) -> String {
    repo.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| repo.display().to_string())
}
