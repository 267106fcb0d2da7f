//! Collaborator configuration and merging.
//!
//! Collaborators come from two places: a JSON config file (defaults plus per-repository lists)
//! and an inline `user:permission,user:permission` list. They are merged file-defaults,
//! file-project, inline, with the later entry for a username replacing the earlier one.

use crate::error::{MigrationError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Repository permission granted to a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Read.
    Pull,
    /// Read and write.
    Push,
    /// Full control.
    Admin,
    /// Write plus some repository settings.
    Maintain,
    /// Read plus issue and pull request management.
    Triage,
}

impl Permission {
    /// The API spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Admin => "admin",
            Self::Maintain => "maintain",
            Self::Triage => "triage",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            "admin" => Ok(Self::Admin),
            "maintain" => Ok(Self::Maintain),
            "triage" => Ok(Self::Triage),
            other => Err(MigrationError::InvalidConfig(format!(
                "unknown permission: {other}"
            ))),
        }
    }
}

/// A user to attach to a newly created repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collaborator {
    /// GitHub login.
    pub username: String,
    /// Granted permission.
    pub permission: Permission,
}

impl Collaborator {
    /// Create a collaborator.
    pub fn new(username: impl Into<String>, permission: Permission) -> Self {
        Self {
            username: username.into(),
            permission,
        }
    }
}

/// File representation; permissions stay strings until validated.
#[derive(Debug, Deserialize)]
struct RawCollaborator {
    username: String,
    permission: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawCollaboratorConfig {
    #[serde(default)]
    default_collaborators: Vec<RawCollaborator>,
    #[serde(default)]
    project_collaborators: HashMap<String, Vec<RawCollaborator>>,
}

/// Parsed collaborator config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorConfig {
    /// Added to every created repository.
    pub default_collaborators: Vec<Collaborator>,
    /// Added only to the repository with the matching name.
    pub project_collaborators: HashMap<String, Vec<Collaborator>>,
}

impl CollaboratorConfig {
    /// Load a config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse config JSON, dropping entries with unknown permissions.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCollaboratorConfig = serde_json::from_str(json)?;

        Ok(Self {
            default_collaborators: validate(raw.default_collaborators),
            project_collaborators: raw
                .project_collaborators
                .into_iter()
                .map(|(name, list)| (name, validate(list)))
                .collect(),
        })
    }
}

fn validate(raw: Vec<RawCollaborator>) -> Vec<Collaborator> {
    raw.into_iter()
        .filter_map(|c| match c.permission.parse() {
            Ok(permission) => Some(Collaborator::new(c.username, permission)),
            Err(_) => {
                warn!(username = %c.username, permission = %c.permission, "Ignoring collaborator with invalid permission");
                None
            }
        })
        .collect()
}

/// Parse `user1:push,user2:admin`.
///
/// Pairs that are not exactly `name:permission` are skipped; unknown permissions are dropped
/// with a warning.
pub fn parse_collaborator_list(list: &str) -> Vec<Collaborator> {
    list.split(',')
        .filter_map(|pair| {
            let parts: Vec<&str> = pair.trim().split(':').collect();
            let [username, permission] = parts.as_slice() else {
                return None;
            };
            let (username, permission) = (username.trim(), permission.trim());
            if username.is_empty() {
                return None;
            }
            match permission.parse() {
                Ok(permission) => Some(Collaborator::new(username, permission)),
                Err(_) => {
                    warn!(%username, %permission, "Ignoring collaborator with invalid permission");
                    None
                }
            }
        })
        .collect()
}

/// Deduplicated collaborators in first-seen order; later entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorSet {
    entries: IndexMap<String, Permission>,
}

impl CollaboratorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge collaborators in order, replacing the permission of usernames already present.
    pub fn merge<'a>(&mut self, collaborators: impl IntoIterator<Item = &'a Collaborator>) {
        for collaborator in collaborators {
            self.entries
                .insert(collaborator.username.clone(), collaborator.permission);
        }
    }

    /// Permission for a username.
    pub fn get(&self, username: &str) -> Option<Permission> {
        self.entries.get(username).copied()
    }

    /// Number of distinct collaborators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = Collaborator> + '_ {
        self.entries
            .iter()
            .map(|(username, permission)| Collaborator::new(username.clone(), *permission))
    }
}

/// Where to look for collaborators when a repository is created.
#[derive(Debug, Clone, Default)]
pub struct CollaboratorSources {
    /// JSON config file.
    pub config_path: Option<PathBuf>,
    /// Inline list from `--collaborators` / `GITHUB_COLLABORATORS`.
    pub inline: Vec<Collaborator>,
}

impl CollaboratorSources {
    /// Set the config file.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set the inline list from its string form.
    pub fn with_inline_list(mut self, list: &str) -> Self {
        self.inline = parse_collaborator_list(list);
        self
    }

    /// Build the collaborator set for one repository.
    ///
    /// An unreadable or invalid config file is logged and contributes nothing.
    pub fn collaborators_for(&self, repo_name: &str) -> CollaboratorSet {
        let mut set = CollaboratorSet::new();

        if let Some(path) = &self.config_path {
            match CollaboratorConfig::load(path) {
                Ok(config) => {
                    if !config.default_collaborators.is_empty() {
                        info!(
                            count = config.default_collaborators.len(),
                            "Loaded default collaborators from config file"
                        );
                    }
                    set.merge(&config.default_collaborators);

                    if let Some(project) = config.project_collaborators.get(repo_name) {
                        info!(
                            count = project.len(),
                            repo = %repo_name,
                            "Loaded project collaborators from config file"
                        );
                        set.merge(project);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read collaborator config");
                }
            }
        }

        if !self.inline.is_empty() {
            info!(count = self.inline.len(), "Using inline collaborators");
        }
        set.merge(&self.inline);

        set
    }
}

/// Outcome of attaching collaborators to a created repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorReport {
    /// Successfully attached.
    pub added: usize,
    /// Usernames that could not be attached.
    pub failed: Vec<String>,
}

impl CollaboratorReport {
    /// Total attempts.
    pub fn attempted(&self) -> usize {
        self.added + self.failed.len()
    }
}
