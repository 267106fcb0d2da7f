//! Batch orchestration and the aggregate report.

use crate::git::{HistoryRewritePort, PushPort, WorkingCopyPort};
use crate::github::HostingPort;
use crate::pipeline::{display_name, RepositoryPipeline};
use crate::types::{PipelineResult, RepositoryOutcome};
use chrono::{DateTime, Utc};
use console::style;
use std::path::PathBuf;
use tracing::info;

/// A repository that did not complete, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRepository {
    /// Repository working directory.
    pub path: PathBuf,
    /// Error message.
    pub reason: String,
}

/// Outcome of a batch run, bucketed by how far each repository got.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Every stage succeeded.
    pub succeeded: Vec<PathBuf>,

    /// History rewritten, but verification or push failed.
    pub push_failed: Vec<FailedRepository>,

    /// History rewrite failed.
    pub rewrite_failed: Vec<FailedRepository>,

    /// Warnings collected from all repositories, prefixed with the repository name.
    pub warnings: Vec<String>,

    /// Start time of the batch.
    pub started_at: Option<DateTime<Utc>>,

    /// End time of the batch.
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// File a pipeline result into its bucket.
    pub fn record(&mut self, result: PipelineResult) {
        let name = display_name(&result.repo_path);
        self.warnings
            .extend(result.warnings.iter().map(|w| format!("{name}: {w}")));

        let reason = result
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();

        match result.outcome() {
            RepositoryOutcome::Succeeded => self.succeeded.push(result.repo_path),
            RepositoryOutcome::PushFailed => self.push_failed.push(FailedRepository {
                path: result.repo_path,
                reason,
            }),
            RepositoryOutcome::RewriteFailed => self.rewrite_failed.push(FailedRepository {
                path: result.repo_path,
                reason,
            }),
        }
    }

    /// Mark the batch as complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Repositories processed.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.push_failed.len() + self.rewrite_failed.len()
    }

    /// Whether every repository succeeded.
    pub fn is_successful(&self) -> bool {
        self.push_failed.is_empty() && self.rewrite_failed.is_empty()
    }

    /// Process exit code: 0 when every repository succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_successful() {
            0
        } else {
            1
        }
    }

    /// Get the duration of the batch.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Print a summary of the batch.
    pub fn print_summary(&self) {
        println!("\n=== Migration Summary ===\n");
        println!("Repositories processed: {}", self.total());

        println!(
            "\n{} Succeeded ({}):",
            style("✓").green(),
            self.succeeded.len()
        );
        for path in &self.succeeded {
            println!("  - {}", path.display());
        }

        if !self.push_failed.is_empty() {
            println!(
                "\n{} History rewritten, push failed ({}), re-run the push:",
                style("!").yellow(),
                self.push_failed.len()
            );
            for failed in &self.push_failed {
                println!("  - {}: {}", failed.path.display(), failed.reason);
            }
        }

        if !self.rewrite_failed.is_empty() {
            println!(
                "\n{} History rewrite failed ({}), re-run the whole repository:",
                style("✗").red(),
                self.rewrite_failed.len()
            );
            for failed in &self.rewrite_failed {
                println!("  - {}: {}", failed.path.display(), failed.reason);
            }
        }

        if !self.warnings.is_empty() {
            println!("\nWarnings ({}):", self.warnings.len());
            for warning in &self.warnings {
                println!("  - {warning}");
            }
        }

        if let Some(duration) = self.duration() {
            println!("\nCompleted in {} seconds", duration.num_seconds());
        }

        let status = if self.is_successful() {
            style("SUCCESS").green().bold()
        } else {
            style("FAILED").red().bold()
        };
        println!("\nStatus: {status}");
    }
}

/// Runs the pipeline over repositories one after another.
pub struct BatchOrchestrator<G, H> {
    pipeline: RepositoryPipeline<G, H>,
}

impl<G, H> BatchOrchestrator<G, H>
where
    G: HistoryRewritePort + PushPort + WorkingCopyPort,
    H: HostingPort,
{
    /// Create an orchestrator around `pipeline`.
    pub fn new(pipeline: RepositoryPipeline<G, H>) -> Self {
        Self { pipeline }
    }

    /// The wrapped pipeline.
    pub fn pipeline(&self) -> &RepositoryPipeline<G, H> {
        &self.pipeline
    }

    /// Process `repositories` in order. A failing repository never stops the batch.
    pub async fn run(&self, repositories: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::new();
        let progress = self.pipeline.progress();
        progress.start(repositories.len() as u64);

        info!(count = repositories.len(), "Starting batch");

        for repo in repositories {
            let result = self.pipeline.process(repo).await;
            progress.finish_repository(&display_name(repo));
            report.record(result);
        }

        report.complete();
        info!(
            succeeded = report.succeeded.len(),
            push_failed = report.push_failed.len(),
            rewrite_failed = report.rewrite_failed.len(),
            "Batch finished"
        );
        report
    }
}
