//! Import command implementation.

use anyhow::{Context, Result};
use firebridge::{import_collection, Config, ImportSummary};

use super::progress_reporter;

/// Run the import job described by `config`.
///
/// Per-document failures are reported in the summary; only setup, file and
/// connectivity problems make this return an error.
pub async fn run_import(config: &Config, show_progress: bool) -> Result<ImportSummary> {
    let options = config.import_options();
    println!(
        "Importing {} into collection '{}' ({})",
        options.input_path.display(),
        options.collection,
        options.conflict_policy.description()
    );

    let store = config
        .firestore
        .open()
        .context("Failed to set up Firestore client")?;
    let progress = progress_reporter(show_progress, "Import:");

    let summary = import_collection(&store, &options, progress.as_ref())
        .await
        .context("Import failed")?;

    if summary.errors > 0 {
        tracing::warn!("{} of {} documents failed to import", summary.errors, summary.total);
    }

    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &ImportSummary) {
    let rule = "=".repeat(50);
    println!();
    println!("{}", rule);
    println!("Import Summary:");
    println!("   Imported: {}", summary.imported);
    println!("   Skipped:  {}", summary.skipped);
    println!("   Errors:   {}", summary.errors);
    println!("   Total:    {}", summary.total);
    println!("{}", rule);

    if !summary.failures.is_empty() {
        println!();
        println!("Failed documents:");
        for failure in &summary.failures {
            println!("   {}: {}", failure.id, failure.reason);
        }
    }

    println!();
    println!("Import completed successfully!");
}
