//! The remote document store capability used by both jobs.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::RemoteDocument;
use crate::error::Result;

/// Operations the exporter and importer need from a document database.
///
/// Implementations must be `Send + Sync` so a single handle can be shared
/// behind an `Arc` by the binaries and the tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read every document of `collection` as one snapshot, in the store's
    /// iteration order.
    async fn list_all(&self, collection: &str) -> Result<Vec<RemoteDocument>>;

    /// Fetch one document, `None` if no document exists at `id`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<RemoteDocument>>;

    /// Merge-write: set the given fields at `id`, leave every other stored
    /// field untouched, create the document if it is missing.
    async fn set_merge(&self, collection: &str, id: &str, fields: Map<String, Value>)
        -> Result<()>;

    /// Verify the store is reachable before a batch starts.
    async fn check_connection(&self, _collection: &str) -> Result<()> {
        Ok(())
    }

    /// Human-readable backend name.
    fn backend_name(&self) -> &'static str;
}
