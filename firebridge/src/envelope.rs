//! The export envelope: the JSON file shared by the exporter and the importer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::document::RemoteDocument;
use crate::error::{Error, Result};

/// One exported document: the key inline with every stored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl From<RemoteDocument> for EnvelopeRecord {
    fn from(doc: RemoteDocument) -> Self {
        let mut fields = doc.fields;
        // The key is authoritative; a stored `id` field would shadow it.
        if fields.remove("id").is_some() {
            tracing::warn!("Document '{}' has a stored `id` field; exporting its key instead", doc.id);
        }
        Self { id: doc.id, fields }
    }
}

/// Root object of an export file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub collection: String,
    pub document_count: usize,
    pub exported_at: String,
    pub documents: Vec<EnvelopeRecord>,
}

impl ExportEnvelope {
    /// Build an envelope; `documentCount` always matches `documents`.
    pub fn new(
        collection: impl Into<String>,
        documents: Vec<RemoteDocument>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        let documents: Vec<EnvelopeRecord> = documents.into_iter().map(Into::into).collect();
        Self {
            collection: collection.into(),
            document_count: documents.len(),
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            documents,
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Overwrite `path` with the pretty-printed envelope.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_pretty_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Lenient view of an envelope used by the importer.
///
/// Entries stay raw so that one malformed entry fails alone instead of
/// failing the whole file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFile {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub documents: Vec<Value>,
}

impl ImportFile {
    pub fn parse(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        if !root.is_object() {
            return Err(Error::Envelope("root is not a JSON object".to_string()));
        }
        if let Some(documents) = root.get("documents") {
            if !documents.is_array() && !documents.is_null() {
                return Err(Error::Envelope("`documents` is not an array".to_string()));
            }
        }
        let mut root = root;
        if root.get("documents").is_some_and(Value::is_null) {
            if let Some(map) = root.as_object_mut() {
                map.remove("documents");
            }
        }
        serde_json::from_value(root).map_err(|e| Error::Envelope(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::parse(&json)
    }

    /// The declared count disagrees with the entries present.
    pub fn count_mismatch(&self) -> Option<(u64, usize)> {
        match self.document_count {
            Some(declared) if declared != self.documents.len() as u64 => {
                Some((declared, self.documents.len()))
            }
            _ => None,
        }
    }
}
