//! CLI command implementations.

use clap::Args;
use rehome_migrate::git::ensure_initial_commit;
use rehome_migrate::{
    discover_repositories, BatchOrchestrator, BatchProgress, CollaboratorSources,
    ConsoleProgressReporter, GitHubClient, Identity, MigrationError, OwnershipConfig, RemoteUrl,
    RepositoryPipeline, RuntimeOptions, SystemGit, WorkingCopyPort, DEFAULT_API_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Arguments of `rehome rewrite`.
#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// GitHub personal access token
    #[arg(env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Author and committer name, also the default owner
    #[arg(short, long, env = "GITHUB_USER")]
    pub user: String,

    /// Author and committer email
    #[arg(short, long, env = "GITHUB_EMAIL")]
    pub email: String,

    /// Directory searched for repositories
    #[arg(short = 'd', long, default_value = ".")]
    pub target_dir: PathBuf,

    /// Move repositories under this personal account
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Move repositories under this organization
    #[arg(long)]
    pub organization: Option<String>,

    /// Collaborators for created repositories (user1:push,user2:admin)
    #[arg(long, env = "GITHUB_COLLABORATORS")]
    pub collaborators: Option<String>,

    /// JSON file with default and per-repository collaborators
    #[arg(short = 'c', long)]
    pub collaborator_config: Option<PathBuf>,

    /// Push every branch and tag, not only the current branch
    #[arg(long)]
    pub push_all: bool,

    /// Create missing repositories as public
    #[arg(long)]
    pub public: bool,

    /// Leave GitHub Actions enabled while pushing
    #[arg(long)]
    pub no_actions_toggle: bool,

    /// GitHub API root
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Enable debug logging (any non-falsey `GIT_REWRITE_DEBUG` value also enables it)
    #[arg(
        long,
        env = "GIT_REWRITE_DEBUG",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub debug: bool,

    /// Personal owner taken from the environment; loses to --owner and --organization
    #[arg(long, hide = true, env = "GITHUB_REPOSITORY_OWNER")]
    pub env_repository_owner: Option<String>,

    /// Organization taken from the environment; loses to every other owner setting
    #[arg(long, hide = true, env = "GITHUB_ORGANIZATION")]
    pub env_organization: Option<String>,
}

impl RewriteArgs {
    /// Build the ownership inputs from flags and captured environment values.
    pub fn ownership(&self) -> OwnershipConfig {
        let mut ownership = OwnershipConfig::new(&self.user);
        ownership.explicit_owner = self.owner.clone();
        ownership.explicit_organization = self.organization.clone();
        ownership.env_repository_owner = self.env_repository_owner.clone();
        ownership.env_organization = self.env_organization.clone();
        ownership
    }

    /// Build the pipeline options.
    pub fn runtime_options(&self) -> Result<RuntimeOptions> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(CliError::InvalidArgument(
                "a GitHub token is required".to_string(),
            ));
        }

        let mut collaborators = CollaboratorSources::default();
        if let Some(path) = &self.collaborator_config {
            collaborators = collaborators.with_config_path(path);
        }
        if let Some(list) = &self.collaborators {
            collaborators = collaborators.with_inline_list(list);
        }

        Ok(RuntimeOptions::new(
            Identity::new(&self.user, &self.email),
            self.ownership(),
        )
        .with_token(token)
        .with_private(!self.public)
        .with_push_all(self.push_all)
        .with_actions_toggle(!self.no_actions_toggle)
        .with_collaborators(collaborators))
    }
}

/// Arguments of `rehome demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// GitHub personal access token
    #[arg(env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// GitHub user that would own the demo repository
    #[arg(short, long, env = "GITHUB_USER")]
    pub user: String,

    /// Email for the demo commits
    #[arg(short, long, env = "GITHUB_EMAIL")]
    pub email: String,

    /// GitHub API root
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

fn print_configuration(args: &RewriteArgs, options: &RuntimeOptions) {
    let owner = options.ownership.resolve();

    println!("Rehome configuration");
    println!("====================");
    println!("Target directory: {}", args.target_dir.display());
    println!("Identity:         {} <{}>", options.identity.name, options.identity.email);
    println!("Target owner:     {owner} ({})", owner.kind());
    println!(
        "Visibility:       {}",
        if options.private { "private" } else { "public" }
    );
    println!(
        "Push:             {}",
        if options.push_all {
            "all branches and tags"
        } else {
            "current branch"
        }
    );
    println!(
        "Actions toggle:   {}",
        if options.toggle_actions { "on" } else { "off" }
    );
    if let Some(path) = &options.collaborators.config_path {
        println!("Collaborators:    {}", path.display());
    }
    if !options.collaborators.inline.is_empty() {
        println!("Inline collaborators: {}", options.collaborators.inline.len());
    }
    println!();
}

/// Rewrite and move every repository under the target directory. Returns the exit code.
pub async fn rewrite(args: RewriteArgs) -> Result<i32> {
    let options = args.runtime_options()?;
    tracing::debug!(?options, "Runtime options");
    print_configuration(&args, &options);

    let repositories = discover_repositories(&args.target_dir)?;
    if repositories.is_empty() {
        println!(
            "No git repositories found under {}",
            args.target_dir.display()
        );
        return Ok(0);
    }

    println!("Found {} repositories", repositories.len());
    for repo in &repositories {
        println!("  - {}", repo.display());
    }
    println!();

    let hosting = GitHubClient::new(options.token.clone())?
        .with_base_url(&args.api_url)
        .with_personal_owner_override(options.ownership.has_personal_owner());

    let reporter = ConsoleProgressReporter::new();
    let progress = Arc::new(BatchProgress::with_callback(reporter.callback()));
    let pipeline =
        RepositoryPipeline::new(SystemGit::new(), hosting, options).with_progress(progress);

    let report = BatchOrchestrator::new(pipeline).run(&repositories).await;
    reporter.finish("Batch complete");

    report.print_summary();
    Ok(report.exit_code())
}

/// Exercise remote parsing, the existence check and initial-commit synthesis without pushing.
pub async fn demo(args: DemoArgs) -> Result<()> {
    if args.token.trim().is_empty() {
        return Err(CliError::InvalidArgument(
            "a GitHub token is required".to_string(),
        ));
    }

    let git = SystemGit::new();
    let identity = Identity::new(&args.user, &args.email);
    let client = GitHubClient::new(Some(args.token.clone()))?.with_base_url(&args.api_url);

    println!("GitHub user:  {}", args.user);
    println!("GitHub token: set");

    let dir = tempfile::Builder::new().prefix("demo_repo_").tempdir()?;
    let repo = dir.path();
    println!("\nDemo directory: {}", repo.display());

    git.init(repo)?;
    std::fs::write(
        repo.join("README.md"),
        "# Demo Repository\n\nThis is a demo repository for testing remote creation.\n",
    )?;
    git.stage_all(repo)?;
    git.commit(repo, &identity, "Initial commit", false)?;

    let suffix = repo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let remote_url = format!("https://github.com/{}/demo-repo-{suffix}.git", args.user);
    git.add_remote(repo, &remote_url)?;
    println!("Remote URL:   {remote_url}");

    println!("\n1. Remote URL parsing");
    let remote = RemoteUrl::parse(&remote_url)
        .ok_or_else(|| MigrationError::UnparseableRemote(remote_url.clone()))?;
    println!("   owner: {}", remote.owner);
    println!("   repo:  {}", remote.repo);
    println!("   with another owner: {}", remote.with_owner("example-org"));

    println!("\n2. Owner resolution");
    let owner = OwnershipConfig::new(&args.user).resolve();
    println!("   resolved owner: {owner} ({})", owner.kind());

    println!("\n3. Repository existence check");
    let exists = client.repository_exists(&remote.owner, &remote.repo).await?;
    println!(
        "   {}/{}: {}",
        remote.owner,
        remote.repo,
        if exists { "exists" } else { "does not exist" }
    );

    println!("\n4. Initial commit for an empty repository");
    let empty = tempfile::Builder::new()
        .prefix("empty_demo_repo_")
        .tempdir()?;
    git.init(empty.path())?;
    let created = ensure_initial_commit(&git, empty.path(), &identity)?;
    println!(
        "   {}",
        if created {
            "initial commit created"
        } else {
            "repository already had commits"
        }
    );
    println!(
        "   has commits now: {}",
        git.has_commits(empty.path())?
    );

    println!("\nDemo complete. Nothing was pushed.");
    Ok(())
}
