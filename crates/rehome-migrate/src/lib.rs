//! # Rehome Migration Engine
//!
//! This crate moves local git repositories to new GitHub ownership. For every repository found
//! under a directory it rewrites commit authorship, repoints `origin` at the new owner, makes
//! sure the GitHub repository exists, and pushes the rewritten history with GitHub Actions paused.
//!
//! ## Features
//!
//! - **Owner resolution**: explicit flags beat environment overrides beat the configured user
//! - **History rewrite**: idempotent author/committer rewrite across all branches and tags
//! - **Remote rewrite**: HTTPS and SSH GitHub URLs, scheme preserved
//! - **Repository reconciliation**: creation with collaborators, Actions toggling
//! - **Push fallback**: one forced retry, token-authenticated remotes restored afterwards
//! - **Batch report**: succeeded, push-failed and rewrite-failed buckets
//!
//! ## Example
//!
//! ```rust,ignore
//! use rehome_migrate::{
//!     discover_repositories, BatchOrchestrator, GitHubClient, Identity, OwnershipConfig,
//!     RepositoryPipeline, RuntimeOptions, SystemGit,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = RuntimeOptions::new(
//!         Identity::new("Alice", "alice@example.com"),
//!         OwnershipConfig::new("alice").with_organization("acme"),
//!     )
//!     .with_token("ghp_xxx");
//!
//!     let hosting = GitHubClient::new(options.token.clone())?;
//!     let pipeline = RepositoryPipeline::new(SystemGit::new(), hosting, options);
//!     let repos = discover_repositories(".".as_ref())?;
//!
//!     let report = BatchOrchestrator::new(pipeline).run(&repos).await;
//!     report.print_summary();
//!     std::process::exit(report.exit_code());
//! }
//! ```

pub mod batch;
pub mod collaborators;
pub mod discover;
pub mod error;
pub mod git;
pub mod github;
pub mod owner;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types
pub use batch::{BatchOrchestrator, BatchReport, FailedRepository};
pub use collaborators::{
    parse_collaborator_list, Collaborator, CollaboratorConfig, CollaboratorReport,
    CollaboratorSet, CollaboratorSources, Permission,
};
pub use discover::discover_repositories;
pub use error::{MigrationError, Result};
pub use git::{GitOutput, HistoryRewritePort, PushEngine, PushPort, RemotePort, SystemGit, WorkingCopyPort};
pub use github::{GitHubClient, HostingPort, DEFAULT_API_URL};
pub use owner::{resolve_owner, OwnerKind, ResolvedOwner};
pub use pipeline::RepositoryPipeline;
pub use progress::{BatchProgress, ConsoleProgressReporter, ProgressCallback, ProgressUpdate};
pub use remote::{rewrite_remote, RemoteRewrite, RemoteScheme, RemoteUrl};
pub use types::*;

/// Version of the migration engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_options_builder() {
        let options = RuntimeOptions::new(
            Identity::new("Alice", "alice@example.com"),
            OwnershipConfig::new("alice"),
        )
        .with_private(false)
        .with_push_all(true)
        .with_actions_toggle(false)
        .with_token("ghp_secret");

        assert!(!options.private);
        assert!(options.push_all);
        assert!(!options.toggle_actions);
        assert!(!format!("{options:?}").contains("ghp_secret"));
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
