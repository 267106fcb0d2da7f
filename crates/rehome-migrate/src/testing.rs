//! In-memory port implementations for tests.

use crate::collaborators::{CollaboratorReport, CollaboratorSet};
use crate::error::{MigrationError, Result};
use crate::git::{GitOutput, HistoryRewritePort, PushPort, RemotePort, WorkingCopyPort};
use crate::github::HostingPort;
use crate::types::Identity;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Default)]
struct GitState {
    default_remote: Option<String>,
    remotes: HashMap<PathBuf, String>,
    rewrite_failures: HashSet<PathBuf>,
    rewritten: Vec<PathBuf>,
    push_results: VecDeque<GitOutput>,
    push_failures: HashSet<PathBuf>,
    push_calls: Vec<String>,
    urls_during_push: Vec<String>,
    set_url_calls: Vec<String>,
    set_url_fails: bool,
    has_commits: bool,
    staged_changes: bool,
    commits: Vec<(String, bool)>,
}

/// Scriptable git.
#[derive(Default)]
pub struct FakeGit {
    state: Mutex<GitState>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// `origin` for every repository without its own entry.
    pub fn with_remote(self, url: &str) -> Self {
        self.state.lock().default_remote = Some(url.to_string());
        self
    }

    pub fn with_remote_for(self, repo: impl Into<PathBuf>, url: &str) -> Self {
        self.state.lock().remotes.insert(repo.into(), url.to_string());
        self
    }

    /// Outputs returned by successive pushes; once drained, pushes succeed.
    pub fn with_push_results(self, results: impl IntoIterator<Item = GitOutput>) -> Self {
        self.state.lock().push_results.extend(results);
        self
    }

    /// Every push from `repo` is rejected.
    pub fn with_push_failure_for(self, repo: impl Into<PathBuf>) -> Self {
        self.state.lock().push_failures.insert(repo.into());
        self
    }

    pub fn with_rewrite_failure_for(self, repo: impl Into<PathBuf>) -> Self {
        self.state.lock().rewrite_failures.insert(repo.into());
        self
    }

    pub fn with_set_url_failure(self) -> Self {
        self.state.lock().set_url_fails = true;
        self
    }

    pub fn with_commits(self, has_commits: bool) -> Self {
        self.state.lock().has_commits = has_commits;
        self
    }

    pub fn with_staged_changes(self, staged: bool) -> Self {
        self.state.lock().staged_changes = staged;
        self
    }

    /// Push arguments, space-joined, in call order.
    pub fn push_calls(&self) -> Vec<String> {
        self.state.lock().push_calls.clone()
    }

    /// The `origin` URL seen by each push.
    pub fn remote_urls_during_push(&self) -> Vec<String> {
        self.state.lock().urls_during_push.clone()
    }

    pub fn set_url_calls(&self) -> Vec<String> {
        self.state.lock().set_url_calls.clone()
    }

    /// `(message, allow_empty)` per commit.
    pub fn commits(&self) -> Vec<(String, bool)> {
        self.state.lock().commits.clone()
    }

    pub fn rewritten(&self) -> Vec<PathBuf> {
        self.state.lock().rewritten.clone()
    }
}

impl GitState {
    fn remote(&self, repo: &Path) -> Option<String> {
        self.remotes
            .get(repo)
            .cloned()
            .or_else(|| self.default_remote.clone())
    }
}

impl HistoryRewritePort for FakeGit {
    fn rewrite_history(&self, repo: &Path, _identity: &Identity) -> Result<()> {
        let mut state = self.state.lock();
        if state.rewrite_failures.contains(repo) {
            return Err(MigrationError::RewriteExecutionFailed(
                "fatal: bad revision".into(),
            ));
        }
        state.rewritten.push(repo.to_path_buf());
        Ok(())
    }
}

impl RemotePort for FakeGit {
    fn remote_url(&self, repo: &Path) -> Result<Option<String>> {
        Ok(self.state.lock().remote(repo))
    }

    fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.set_url_fails {
            return Err(MigrationError::RemoteUrlUpdateFailed(
                "error: could not lock config file".into(),
            ));
        }
        state.set_url_calls.push(url.to_string());
        state.remotes.insert(repo.to_path_buf(), url.to_string());
        Ok(())
    }
}

impl PushPort for FakeGit {
    fn push(&self, repo: &Path, args: &[&str]) -> Result<GitOutput> {
        let mut state = self.state.lock();
        state.push_calls.push(args.join(" "));
        let url = state.remote(repo).unwrap_or_default();
        state.urls_during_push.push(url);

        if state.push_failures.contains(repo) {
            return Ok(GitOutput::failed("! [rejected] HEAD -> main (protected branch)"));
        }
        Ok(state
            .push_results
            .pop_front()
            .unwrap_or_else(|| GitOutput::ok("Everything up-to-date")))
    }
}

impl WorkingCopyPort for FakeGit {
    fn current_branch(&self, _repo: &Path) -> Result<String> {
        Ok("main".into())
    }

    fn has_commits(&self, _repo: &Path) -> Result<bool> {
        Ok(self.state.lock().has_commits)
    }

    fn stage_all(&self, _repo: &Path) -> Result<()> {
        Ok(())
    }

    fn has_staged_changes(&self, _repo: &Path) -> Result<bool> {
        Ok(self.state.lock().staged_changes)
    }

    fn commit(
        &self,
        _repo: &Path,
        _identity: &Identity,
        message: &str,
        allow_empty: bool,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.commits.push((message.to_string(), allow_empty));
        state.has_commits = true;
        Ok(())
    }
}

#[derive(Default)]
struct HostingState {
    existing: HashSet<String>,
    created: Vec<(String, bool, usize)>,
    actions: HashMap<String, bool>,
    actions_updates: Vec<(String, bool)>,
    actions_query_fails: bool,
    creation_fails: bool,
    failing_collaborators: HashSet<String>,
    calls: usize,
}

/// Scriptable hosting service. Actions default to enabled.
#[derive(Default)]
pub struct FakeHosting {
    state: Mutex<HostingState>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, full_name: &str) -> Self {
        self.state.lock().existing.insert(full_name.to_string());
        self
    }

    pub fn with_actions(self, full_name: &str, enabled: bool) -> Self {
        self.state
            .lock()
            .actions
            .insert(full_name.to_string(), enabled);
        self
    }

    pub fn with_actions_query_failure(self) -> Self {
        self.state.lock().actions_query_fails = true;
        self
    }

    pub fn with_creation_failure(self) -> Self {
        self.state.lock().creation_fails = true;
        self
    }

    pub fn with_failing_collaborator(self, username: &str) -> Self {
        self.state
            .lock()
            .failing_collaborators
            .insert(username.to_string());
        self
    }

    /// `(full_name, private, collaborator_count)` per creation.
    pub fn created(&self) -> Vec<(String, bool, usize)> {
        self.state.lock().created.clone()
    }

    /// `(full_name, enabled)` per Actions update.
    pub fn actions_updates(&self) -> Vec<(String, bool)> {
        self.state.lock().actions_updates.clone()
    }

    /// Total calls of any kind.
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }
}

#[async_trait]
impl HostingPort for FakeHosting {
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls += 1;
        Ok(state.existing.contains(&format!("{owner}/{repo}")))
    }

    async fn create_repository_with_collaborators(
        &self,
        owner: &str,
        repo: &str,
        private: bool,
        collaborators: &CollaboratorSet,
    ) -> Result<CollaboratorReport> {
        let mut state = self.state.lock();
        state.calls += 1;
        if state.creation_fails {
            return Err(MigrationError::CreationFailed("status 500".into()));
        }

        let full_name = format!("{owner}/{repo}");
        state.existing.insert(full_name.clone());
        state
            .created
            .push((full_name, private, collaborators.len()));

        let mut report = CollaboratorReport::default();
        for collaborator in collaborators.iter() {
            if state.failing_collaborators.contains(&collaborator.username) {
                report.failed.push(collaborator.username);
            } else {
                report.added += 1;
            }
        }
        Ok(report)
    }

    async fn actions_enabled(&self, owner: &str, repo: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls += 1;
        if state.actions_query_fails {
            return Err(MigrationError::ApiError("status 403".into()));
        }
        Ok(*state
            .actions
            .get(&format!("{owner}/{repo}"))
            .unwrap_or(&true))
    }

    async fn set_actions_enabled(&self, owner: &str, repo: &str, enabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        state.calls += 1;
        let full_name = format!("{owner}/{repo}");
        state.actions.insert(full_name.clone(), enabled);
        state.actions_updates.push((full_name, enabled));
        Ok(())
    }
}
