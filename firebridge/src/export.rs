//! Collection export: one snapshot read, one envelope file.

use chrono::Utc;
use std::path::PathBuf;

use crate::envelope::ExportEnvelope;
use crate::error::Result;
use crate::progress::{DocumentOutcome, TransferProgress};
use crate::store::DocumentStore;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub collection: String,
    pub output_path: PathBuf,
}

/// Result of an export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The envelope was written to `path`.
    Written { path: PathBuf, document_count: usize },
    /// The collection held no documents; no file was written.
    Empty,
}

/// Export every document of `options.collection` to `options.output_path`.
///
/// An empty collection is not an error, but leaves the filesystem untouched
/// so callers can tell "nothing to export" apart from an empty envelope.
/// Any prior file at the output path is overwritten.
pub async fn export_collection(
    store: &dyn DocumentStore,
    options: &ExportOptions,
    progress: &dyn TransferProgress,
) -> Result<ExportOutcome> {
    tracing::info!(
        "Starting export of '{}' collection from {}",
        options.collection,
        store.backend_name()
    );

    let documents = store.list_all(&options.collection).await?;
    if documents.is_empty() {
        tracing::warn!("No documents found in collection '{}'", options.collection);
        return Ok(ExportOutcome::Empty);
    }

    progress.on_start(documents.len() as u64);
    for doc in &documents {
        tracing::info!("Found document: {}", doc.id);
        progress.on_document(&doc.id, DocumentOutcome::Exported);
    }

    let envelope = ExportEnvelope::new(&options.collection, documents, Utc::now());
    envelope.write_to(&options.output_path)?;
    progress.on_finish();

    tracing::info!(
        "Exported {} documents to {}",
        envelope.document_count,
        options.output_path.display()
    );

    Ok(ExportOutcome::Written {
        path: options.output_path.clone(),
        document_count: envelope.document_count,
    })
}
