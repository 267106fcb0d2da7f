//! Push with force fallback and token-authenticated remotes.

use super::PushPort;
use crate::error::{MigrationError, Result};
use crate::remote::RemoteUrl;
use std::path::Path;
use tracing::{error, info, warn};

/// Pushes through a [`PushPort`].
///
/// With a token, `origin` is pointed at `https://<token>@github.com/<owner>/<repo>.git` for the
/// duration of one push (including its forced retry) and put back afterwards, whether or not
/// the push succeeded.
pub struct PushEngine<'a, P: PushPort + ?Sized> {
    port: &'a P,
    token: Option<&'a str>,
}

impl<'a, P: PushPort + ?Sized> PushEngine<'a, P> {
    /// Create an engine. Empty tokens are treated as absent.
    pub fn new(port: &'a P, token: Option<&'a str>) -> Self {
        Self {
            port,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Push `refspec` to `origin`, retrying once with `--force`.
    pub fn push(&self, repo: &Path, refspec: &str) -> Result<()> {
        info!(repo = %repo.display(), %refspec, "Pushing");
        self.with_token_remote(repo, || {
            self.push_with_fallback(repo, &["origin", refspec], refspec)
        })
    }

    /// Push every branch, then every tag.
    ///
    /// A branch failure is logged and does not stop the tag push; only a tag failure is returned.
    pub fn push_all(&self, repo: &Path) -> Result<()> {
        info!(repo = %repo.display(), "Pushing all branches");
        let branches = self.with_token_remote(repo, || {
            self.push_with_fallback(repo, &["--all", "origin"], "--all")
        });
        if let Err(e) = &branches {
            warn!(repo = %repo.display(), error = %e, "Branch push failed, continuing with tags");
        }

        info!(repo = %repo.display(), "Pushing all tags");
        self.with_token_remote(repo, || {
            self.push_with_fallback(repo, &["--tags", "origin"], "--tags")
        })?;

        info!(repo = %repo.display(), "All branches and tags pushed");
        Ok(())
    }

    fn push_with_fallback(&self, repo: &Path, args: &[&str], refspec: &str) -> Result<()> {
        let first = self.port.push(repo, args)?;
        if first.success {
            return Ok(());
        }

        warn!(repo = %repo.display(), %refspec, "Push rejected, retrying with --force");
        let mut forced_args = vec!["--force"];
        forced_args.extend_from_slice(args);
        let second = self.port.push(repo, &forced_args)?;
        if second.success {
            info!(repo = %repo.display(), %refspec, "Forced push succeeded");
            return Ok(());
        }

        Err(MigrationError::PushFailed {
            refspec: refspec.to_string(),
            attempts: vec![
                self.scrub(&first.output),
                self.scrub(&second.output),
            ],
        })
    }

    fn with_token_remote<T>(&self, repo: &Path, push: impl FnOnce() -> Result<T>) -> Result<T> {
        let Some(token) = self.token else {
            return push();
        };

        let original = self
            .port
            .remote_url(repo)?
            .ok_or(MigrationError::MissingRemote)?;

        let Some(remote) = RemoteUrl::parse(&original) else {
            warn!(url = %original, "Remote is not a GitHub URL, pushing without token");
            return push();
        };

        self.port
            .set_remote_url(repo, &remote.authenticated_url(token))?;

        let result = push();

        match self.port.set_remote_url(repo, &original) {
            Ok(()) => result,
            Err(restore) => {
                error!(repo = %repo.display(), error = %restore, "Failed to restore remote URL after push");
                result.and(Err(restore))
            }
        }
    }

    fn scrub(&self, output: &str) -> String {
        match self.token {
            Some(token) => output.replace(token, "***"),
            None => output.to_string(),
        }
    }
}
