//! Export command implementation.

use anyhow::{Context, Result};
use firebridge::{export_collection, Config, ExportOutcome};

use super::progress_reporter;

/// Run the export job described by `config`.
pub async fn run_export(config: &Config, show_progress: bool) -> Result<ExportOutcome> {
    let options = config.export_options();
    tracing::debug!(?options, "Export options");
    println!("Exporting collection '{}'", options.collection);

    let store = config
        .firestore
        .open()
        .context("Failed to set up Firestore client")?;
    let progress = progress_reporter(show_progress, "Export:");

    let outcome = export_collection(&store, &options, progress.as_ref())
        .await
        .with_context(|| format!("Export of '{}' failed", options.collection))?;

    println!();
    match &outcome {
        ExportOutcome::Written {
            path,
            document_count,
        } => {
            println!("Export successful!");
            println!("File saved to: {}", path.display());
            println!("Total documents: {}", document_count);
        }
        ExportOutcome::Empty => {
            println!(
                "No documents found in collection '{}'; no file written",
                options.collection
            );
        }
    }

    Ok(outcome)
}
