//! Envelope import: replay a file's documents into a collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::document::Document;
use crate::envelope::ImportFile;
use crate::error::{Error, Result};
use crate::progress::{DocumentOutcome, TransferProgress};
use crate::store::DocumentStore;

/// What to do when an imported id already exists in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Merge the file's fields into the existing document.
    #[default]
    Overwrite,
    /// Leave the existing document alone.
    Skip,
}

impl ConflictPolicy {
    pub fn description(self) -> &'static str {
        match self {
            ConflictPolicy::Overwrite => "Overwrite existing",
            ConflictPolicy::Skip => "Skip existing",
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
            ConflictPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" | "merge" => Ok(ConflictPolicy::Overwrite),
            "skip" | "skip-existing" => Ok(ConflictPolicy::Skip),
            _ => Err(format!(
                "Invalid conflict policy '{}'. Use 'overwrite' or 'skip'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub collection: String,
    pub input_path: PathBuf,
    pub conflict_policy: ConflictPolicy,
}

/// A document that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub id: String,
    pub reason: String,
}

/// Tally of an import run. Every input entry lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportSummary {
    /// `imported + skipped + errors == total`.
    pub fn is_complete(&self) -> bool {
        self.imported + self.skipped + self.errors == self.total
    }
}

/// Import the envelope at `options.input_path` into `options.collection`.
///
/// Unreadable or unparsable files and an unreachable store abort the job.
/// Failures of single documents are tallied and never stop the batch.
pub async fn import_collection(
    store: &dyn DocumentStore,
    options: &ImportOptions,
    progress: &dyn TransferProgress,
) -> Result<ImportSummary> {
    tracing::info!("Starting import into {}", store.backend_name());
    tracing::info!("Reading: {}", options.input_path.display());
    tracing::info!("Collection: {}", options.collection);
    tracing::info!("Mode: {}", options.conflict_policy.description());

    let file = ImportFile::read(&options.input_path)?;
    if let Some(source) = file.collection.as_deref() {
        if source != options.collection {
            tracing::info!("File was exported from collection '{}'", source);
        }
    }
    if let Some((declared, found)) = file.count_mismatch() {
        tracing::warn!(
            "Envelope declares {} documents but contains {}",
            declared,
            found
        );
    }

    store.check_connection(&options.collection).await?;

    tracing::info!("Total documents to import: {}", file.documents.len());
    let summary = import_documents(
        store,
        &options.collection,
        &file.documents,
        options.conflict_policy,
        progress,
    )
    .await;
    Ok(summary)
}

/// Replay raw envelope entries one by one, in order.
pub async fn import_documents(
    store: &dyn DocumentStore,
    collection: &str,
    entries: &[Value],
    policy: ConflictPolicy,
    progress: &dyn TransferProgress,
) -> ImportSummary {
    let mut summary = ImportSummary {
        total: entries.len(),
        ..Default::default()
    };
    progress.on_start(entries.len() as u64);

    for (position, entry) in entries.iter().enumerate() {
        match import_entry(store, collection, entry, position, policy).await {
            Ok((id, DocumentOutcome::Skipped)) => {
                summary.skipped += 1;
                progress.on_document(&id, DocumentOutcome::Skipped);
            }
            Ok((id, outcome)) => {
                summary.imported += 1;
                progress.on_document(&id, outcome);
            }
            Err(e) => {
                let (id, reason) = match e {
                    Error::Document { id, reason } => (id, reason),
                    other => (format!("<entry {}>", position), other.to_string()),
                };
                tracing::warn!("Failed: {} ({})", id, reason);
                progress.on_document(&id, DocumentOutcome::Failed);
                summary.errors += 1;
                summary.failures.push(ImportFailure { id, reason });
            }
        }
    }

    progress.on_finish();
    summary
}

async fn import_entry(
    store: &dyn DocumentStore,
    collection: &str,
    entry: &Value,
    position: usize,
    policy: ConflictPolicy,
) -> Result<(String, DocumentOutcome)> {
    let doc = Document::from_entry(entry, position)?;

    let existing = store
        .get(collection, &doc.id)
        .await
        .map_err(|e| Error::document(doc.id.clone(), e.to_string()))?;

    if existing.is_some() && policy == ConflictPolicy::Skip {
        tracing::info!("Skipped: {} (already exists)", doc.id);
        return Ok((doc.id, DocumentOutcome::Skipped));
    }

    store
        .set_merge(collection, &doc.id, doc.payload())
        .await
        .map_err(|e| Error::document(doc.id.clone(), e.to_string()))?;

    tracing::info!("Imported: {} - {}", doc.id, doc.name());
    Ok((doc.id, DocumentOutcome::Imported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_policy_parse_and_display() {
        assert_eq!("skip".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Skip);
        assert_eq!(
            "Overwrite".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::Overwrite
        );
        assert!("replace".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::Skip.to_string(), "skip");
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Overwrite);
    }

    #[test]
    fn test_summary_completeness() {
        let summary = ImportSummary {
            total: 4,
            imported: 2,
            skipped: 1,
            errors: 1,
            failures: vec![],
        };
        assert!(summary.is_complete());
        assert!(!ImportSummary { total: 1, ..Default::default() }.is_complete());
    }
}
