//! Progress tracking for batch runs.

use crate::types::PipelineStage;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Progress update information.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Stage the current repository just reached.
    pub stage: PipelineStage,

    /// Repository being processed.
    pub repository: Option<String>,

    /// Repositories finished so far.
    pub completed: u64,

    /// Repositories in the batch.
    pub total: u64,
}

fn stage_from_u8(value: u8) -> PipelineStage {
    match value {
        0 => PipelineStage::Discovered,
        1 => PipelineStage::HistoryRewritten,
        2 => PipelineStage::RemoteUpdated,
        3 => PipelineStage::Pushed,
        _ => PipelineStage::Done,
    }
}

/// Progress tracker for a batch of repositories.
pub struct BatchProgress {
    stage: AtomicU8,
    completed: AtomicU64,
    total: AtomicU64,
    callback: Option<Arc<ProgressCallback>>,
}

impl BatchProgress {
    /// Create a tracker without a callback.
    pub fn new() -> Self {
        Self {
            stage: AtomicU8::new(0),
            completed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            callback: None,
        }
    }

    /// Create a tracker that reports every change to `callback`.
    pub fn with_callback(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
            ..Self::new()
        }
    }

    /// Start a batch of `total` repositories.
    pub fn start(&self, total: u64) {
        self.stage.store(PipelineStage::Discovered as u8, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.notify(None);
    }

    /// Record that `repository` reached `stage`.
    pub fn stage(&self, repository: &str, stage: PipelineStage) {
        self.stage.store(stage as u8, Ordering::SeqCst);
        self.notify(Some(repository.to_string()));
    }

    /// Record that `repository` is finished, whatever its outcome.
    pub fn finish_repository(&self, repository: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.stage.store(PipelineStage::Done as u8, Ordering::SeqCst);
        self.notify(Some(repository.to_string()));
    }

    /// Stage of the repository in flight.
    pub fn current_stage(&self) -> PipelineStage {
        stage_from_u8(self.stage.load(Ordering::SeqCst))
    }

    fn notify(&self, repository: Option<String>) {
        if let Some(callback) = &self.callback {
            callback(ProgressUpdate {
                stage: self.current_stage(),
                repository,
                completed: self.completed.load(Ordering::SeqCst),
                total: self.total.load(Ordering::SeqCst),
            });
        }
    }
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Console progress reporter using indicatif.
pub struct ConsoleProgressReporter {
    progress_bar: indicatif::ProgressBar,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter.
    pub fn new() -> Self {
        let progress_bar = indicatif::ProgressBar::new(0);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar());
        progress_bar.set_style(style);

        Self { progress_bar }
    }

    /// Create a callback that drives the bar.
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.progress_bar.clone();
        Box::new(move |update: ProgressUpdate| {
            pb.set_length(update.total);
            pb.set_position(update.completed);

            let msg = match &update.repository {
                Some(repo) => format!("{repo}: {}", update.stage),
                None => update.stage.to_string(),
            };
            pb.set_message(msg);
        })
    }

    /// Finish the progress bar.
    pub fn finish(&self, message: &str) {
        self.progress_bar.finish_with_message(message.to_string());
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_progress_tracker() {
        let progress = BatchProgress::new();

        progress.start(4);
        assert_eq!(progress.current_stage(), PipelineStage::Discovered);

        progress.stage("a", PipelineStage::HistoryRewritten);
        assert_eq!(progress.current_stage(), PipelineStage::HistoryRewritten);

        progress.finish_repository("a");
        assert_eq!(progress.current_stage(), PipelineStage::Done);
    }

    #[test]
    fn test_stage_encoding_round_trips() {
        for stage in [
            PipelineStage::Discovered,
            PipelineStage::HistoryRewritten,
            PipelineStage::RemoteUpdated,
            PipelineStage::Pushed,
            PipelineStage::Done,
        ] {
            assert_eq!(stage_from_u8(stage as u8), stage);
        }
    }

    #[test]
    fn test_progress_with_callback() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();

        let progress = BatchProgress::with_callback(Box::new(move |update| {
            sink.lock().push(update);
        }));

        progress.start(2);
        progress.stage("api", PipelineStage::Pushed);
        progress.finish_repository("api");

        let updates = updates.lock();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[1].repository.as_deref(), Some("api"));
        assert_eq!(updates[1].stage, PipelineStage::Pushed);
        assert_eq!(updates[2].completed, 1);
        assert_eq!(updates[2].total, 2);
    }
}
