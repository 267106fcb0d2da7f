//! Repository discovery.

use crate::error::{MigrationError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Find every git working directory under `root`, including `root` itself.
///
/// `.git` directories are not descended into. Results are absolute and in file-name walk order.
pub fn discover_repositories(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize()?;
    if !root.is_dir() {
        return Err(MigrationError::InvalidConfig(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut repositories = Vec::new();
    let mut walker = WalkDir::new(&root).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() && entry.file_name() == ".git" {
            if let Some(parent) = entry.path().parent() {
                debug!(path = %parent.display(), "Found repository");
                repositories.push(parent.to_path_buf());
            }
            walker.skip_current_dir();
        }
    }

    info!(root = %root.display(), count = repositories.len(), "Discovered repositories");
    Ok(repositories)
}
