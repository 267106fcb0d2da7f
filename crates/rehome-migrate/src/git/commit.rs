//! Initial commit synthesis for repositories with no history.

use super::WorkingCopyPort;
use crate::error::Result;
use crate::types::Identity;
use std::path::Path;
use tracing::info;

/// Message used for a synthesized first commit.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

fn readme_contents(repo: &Path) -> String {
    let name = repo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string());
    format!("# {name}\n\nThis repository was created automatically.\n")
}

/// Make sure `HEAD` points at a commit so there is something to push.
///
/// Writes a README when none exists, stages the working tree, and commits as `identity`. The
/// commit is allowed to be empty when staging produced no changes. Returns whether a commit
/// was created.
pub fn ensure_initial_commit<P: WorkingCopyPort + ?Sized>(
    port: &P,
    repo: &Path,
    identity: &Identity,
) -> Result<bool> {
    if port.has_commits(repo)? {
        return Ok(false);
    }

    info!(repo = %repo.display(), "Repository has no commits, creating initial commit");

    let readme = repo.join("README.md");
    if !readme.exists() {
        std::fs::write(&readme, readme_contents(repo))?;
    }

    port.stage_all(repo)?;
    let allow_empty = !port.has_staged_changes(repo)?;
    port.commit(repo, identity, INITIAL_COMMIT_MESSAGE, allow_empty)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGit;

    #[test]
    fn test_existing_history_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new().with_commits(true);

        let created =
            ensure_initial_commit(&git, dir.path(), &Identity::new("A", "a@example.com")).unwrap();

        assert!(!created);
        assert!(git.commits().is_empty());
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn test_readme_written_and_committed() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new().with_staged_changes(true);

        let created =
            ensure_initial_commit(&git, dir.path(), &Identity::new("A", "a@example.com")).unwrap();

        assert!(created);
        let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.contains("This repository was created automatically."));
        assert_eq!(git.commits(), vec![(INITIAL_COMMIT_MESSAGE.to_string(), false)]);
    }

    #[test]
    fn test_existing_readme_kept_and_empty_commit_allowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "mine").unwrap();
        let git = FakeGit::new();

        ensure_initial_commit(&git, dir.path(), &Identity::new("A", "a@example.com")).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "mine"
        );
        assert_eq!(git.commits(), vec![(INITIAL_COMMIT_MESSAGE.to_string(), true)]);
    }
}
