//! firebridge: move Firestore collections to and from JSON envelope files.
//!
//! - [`export::export_collection`] snapshots a collection into one file
//! - [`import::import_collection`] replays a file into a collection,
//!   skipping or merging over existing documents
//!
//! Both jobs talk to the database through the [`DocumentStore`] trait, so the
//! same code runs against Cloud Firestore, its emulator, or [`MemoryStore`].

pub mod config;
pub mod credentials;
pub mod document;
pub mod envelope;
pub mod error;
pub mod export;
pub mod import;
pub mod progress;
pub mod store;

pub use config::Config;
pub use document::{Document, RemoteDocument};
pub use envelope::{EnvelopeRecord, ExportEnvelope, ImportFile};
pub use error::{Error, Result};
pub use export::{export_collection, ExportOptions, ExportOutcome};
pub use import::{
    import_collection, import_documents, ConflictPolicy, ImportFailure, ImportOptions,
    ImportSummary,
};
pub use progress::{BarProgress, DocumentOutcome, NoopProgress, TransferProgress};
pub use store::{DocumentStore, FirestoreStore, MemoryStore};
