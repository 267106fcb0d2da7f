//! Authorship rewrite via `git filter-branch`.

use super::{decode_output, HistoryRewritePort, SystemGit};
use crate::error::{MigrationError, Result};
use crate::types::Identity;
use std::path::Path;
use tracing::{debug, info};

/// Where filter-branch keeps the pre-rewrite refs, relative to the repository root.
pub const BACKUP_REFS: &str = ".git/refs/original";

const NAME_VAR: &str = "REHOME_TARGET_NAME";
const EMAIL_VAR: &str = "REHOME_TARGET_EMAIL";

/// The `--env-filter` script.
///
/// The identity is passed through environment variables rather than spliced into the script,
/// so names containing quotes or `$` survive intact. Author and committer are only overridden
/// when they differ, which makes a second run a no-op.
pub fn env_filter_script() -> String {
    format!(
        r#"
if [ "$GIT_COMMITTER_EMAIL" != "${EMAIL_VAR}" ] || [ "$GIT_COMMITTER_NAME" != "${NAME_VAR}" ]; then
    export GIT_COMMITTER_NAME="${NAME_VAR}"
    export GIT_COMMITTER_EMAIL="${EMAIL_VAR}"
fi
if [ "$GIT_AUTHOR_EMAIL" != "${EMAIL_VAR}" ] || [ "$GIT_AUTHOR_NAME" != "${NAME_VAR}" ]; then
    export GIT_AUTHOR_NAME="${NAME_VAR}"
    export GIT_AUTHOR_EMAIL="${EMAIL_VAR}"
fi
"#
    )
}

impl HistoryRewritePort for SystemGit {
    fn rewrite_history(&self, repo: &Path, identity: &Identity) -> Result<()> {
        if !repo.join(".git").exists() {
            return Err(MigrationError::NotAGitRepository(repo.to_path_buf()));
        }

        let backup = repo.join(BACKUP_REFS);
        if backup.exists() {
            info!(path = %backup.display(), "Removing previous rewrite backup");
            std::fs::remove_dir_all(&backup).map_err(|e| {
                MigrationError::RewriteExecutionFailed(format!(
                    "failed to remove {}: {e}",
                    backup.display()
                ))
            })?;
        }

        info!(repo = %repo.display(), name = %identity.name, email = %identity.email, "Rewriting history");

        let script = env_filter_script();
        let output = self
            .command(repo)
            .args([
                "filter-branch",
                "-f",
                "--env-filter",
                script.as_str(),
                "--tag-name-filter",
                "cat",
                "--",
                "--branches",
                "--tags",
            ])
            .env("LC_ALL", "C.UTF-8")
            .env("LANG", "C.UTF-8")
            .env("FILTER_BRANCH_SQUELCH_WARNING", "1")
            .env(NAME_VAR, &identity.name)
            .env(EMAIL_VAR, &identity.email)
            .output()
            .map_err(|e| MigrationError::RewriteExecutionFailed(e.to_string()))?;

        let mut text = decode_output(&output.stdout);
        text.push_str(&decode_output(&output.stderr));

        if !output.status.success() {
            return Err(MigrationError::RewriteExecutionFailed(format!(
                "{}\n{text}",
                output.status
            )));
        }

        debug!(output = %text, "filter-branch finished");
        info!(repo = %repo.display(), "History rewritten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_checks_before_overriding() {
        let script = env_filter_script();
        assert!(script.contains(r#"[ "$GIT_AUTHOR_EMAIL" != "$REHOME_TARGET_EMAIL" ]"#));
        assert!(script.contains(r#"export GIT_COMMITTER_NAME="$REHOME_TARGET_NAME""#));
        assert_eq!(script.matches("export ").count(), 4);
    }

    #[test]
    fn test_non_git_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        // A bogus program proves no subprocess is spawned.
        let git = SystemGit::with_program("/nonexistent/rehome-git");

        let err = git
            .rewrite_history(dir.path(), &Identity::new("a", "a@example.com"))
            .unwrap_err();
        assert!(matches!(err, MigrationError::NotAGitRepository(_)));
    }

    #[test]
    fn test_backup_refs_removed_before_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join(BACKUP_REFS).join("refs/heads");
        std::fs::create_dir_all(&backup).unwrap();

        let git = SystemGit::with_program("/nonexistent/rehome-git");
        let err = git
            .rewrite_history(dir.path(), &Identity::new("a", "a@example.com"))
            .unwrap_err();

        assert!(matches!(err, MigrationError::RewriteExecutionFailed(_)));
        assert!(!dir.path().join(BACKUP_REFS).exists());
    }
}
