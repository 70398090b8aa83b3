use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// What happened to one document during a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    Exported,
    Imported,
    Skipped,
    Failed,
}

/// Progress callback for export/import jobs.
pub trait TransferProgress: Send + Sync {
    /// Called once the number of documents is known.
    fn on_start(&self, total: u64);

    /// Called after each document, in processing order.
    fn on_document(&self, id: &str, outcome: DocumentOutcome);

    /// Called when the job finishes.
    fn on_finish(&self);
}

/// No-op progress reporter for when progress isn't needed.
pub struct NoopProgress;

impl TransferProgress for NoopProgress {
    fn on_start(&self, _total: u64) {}
    fn on_document(&self, _id: &str, _outcome: DocumentOutcome) {}
    fn on_finish(&self) {}
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
    processed: AtomicU64,
    failed: AtomicU64,
    start: Instant,
}

impl BarProgress {
    pub fn new(prefix: impl Into<String>) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{prefix} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        bar.set_prefix(prefix.into());

        Self {
            bar,
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl TransferProgress for BarProgress {
    fn on_start(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn on_document(&self, id: &str, outcome: DocumentOutcome) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if outcome == DocumentOutcome::Failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.bar.set_message(id.to_string());
        self.bar.inc(1);
    }

    fn on_finish(&self) {
        self.bar.finish_with_message(format!(
            "Done! {} documents in {:.1}s ({} failed)",
            self.processed(),
            self.start.elapsed().as_secs_f64(),
            self.failed()
        ));
    }
}
