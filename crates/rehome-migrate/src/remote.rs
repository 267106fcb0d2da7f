//! GitHub remote URL parsing and owner substitution.

use crate::error::Result;
use crate::git::RemotePort;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

static HTTPS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$")
        .expect("HTTPS remote pattern is valid")
});

static SSH_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?/?$")
        .expect("SSH remote pattern is valid")
});

static USERINFO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"://[^/@]+@").expect("userinfo pattern is valid")
});

/// Transport of a GitHub remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteScheme {
    /// `https://github.com/<owner>/<repo>`
    Https,
    /// `git@github.com:<owner>/<repo>.git`
    Ssh,
}

/// A parsed GitHub remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// Transport.
    pub scheme: RemoteScheme,
    /// Account segment.
    pub owner: String,
    /// Repository segment, without `.git`.
    pub repo: String,
}

impl RemoteUrl {
    /// Parse an HTTPS or SSH GitHub URL.
    ///
    /// A `.git` suffix and a trailing slash are optional; repeated `.git` suffixes are all
    /// stripped. Anything else yields `None`.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let (scheme, captures) = if let Some(c) = HTTPS_URL.captures(url) {
            (RemoteScheme::Https, c)
        } else if let Some(c) = SSH_URL.captures(url) {
            (RemoteScheme::Ssh, c)
        } else {
            debug!(url = %redact(url), "Remote URL not recognised");
            return None;
        };

        let owner = captures.get(1)?.as_str().to_string();
        let mut repo = captures.get(2)?.as_str();
        while let Some(stripped) = repo.strip_suffix(".git") {
            repo = stripped;
        }
        if repo.is_empty() {
            debug!(url = %redact(url), "Remote URL has no repository name");
            return None;
        }
        let repo = repo.to_string();
        debug!(?scheme, %owner, %repo, "Parsed remote URL");

        Some(Self {
            scheme,
            owner,
            repo,
        })
    }

    /// The same repository under another owner.
    pub fn with_owner(&self, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..self.clone()
        }
    }

    /// HTTPS URL carrying `token` as userinfo. Never log the result.
    pub fn authenticated_url(&self, token: &str) -> String {
        format!("https://{token}@github.com/{}/{}.git", self.owner, self.repo)
    }
}

impl std::fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scheme {
            RemoteScheme::Https => write!(f, "https://github.com/{}/{}", self.owner, self.repo),
            RemoteScheme::Ssh => write!(f, "git@github.com:{}/{}.git", self.owner, self.repo),
        }
    }
}

/// Mask credentials embedded in a URL.
pub fn redact(url: &str) -> String {
    USERINFO.replace(url, "://***@").into_owned()
}

/// What [`rewrite_remote`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRewrite {
    /// `origin` now points at the new owner.
    Updated {
        /// Previous URL.
        from: String,
        /// New URL.
        to: String,
    },
    /// `origin` already pointed at the new owner.
    Unchanged,
    /// No `origin` configured.
    NoRemote,
    /// `origin` is not a recognised GitHub URL; left untouched.
    Unparseable(String),
}

/// Point `origin` at `owner`, keeping the scheme and repository name.
///
/// Only a failing `git remote set-url` is an error, and the pipeline treats it as a warning.
pub fn rewrite_remote<P: RemotePort + ?Sized>(
    port: &P,
    repo: &Path,
    owner: &str,
) -> Result<RemoteRewrite> {
    let Some(current) = port.remote_url(repo)? else {
        info!(repo = %repo.display(), "No origin remote, skipping URL update");
        return Ok(RemoteRewrite::NoRemote);
    };

    let Some(parsed) = RemoteUrl::parse(&current) else {
        warn!(repo = %repo.display(), url = %redact(&current), "Cannot parse origin URL, skipping update");
        return Ok(RemoteRewrite::Unparseable(current));
    };

    let updated = parsed.with_owner(owner).to_string();
    if updated == current {
        return Ok(RemoteRewrite::Unchanged);
    }

    port.set_remote_url(repo, &updated)?;
    info!(repo = %repo.display(), from = %redact(&current), to = %updated, "Updated origin URL");

    Ok(RemoteRewrite::Updated {
        from: current,
        to: updated,
    })
}
