use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid credentials file '{path}': {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Connection failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Authentication failed (status {status})")]
    Auth { status: u16 },

    #[error("Firestore API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Document error at '{id}': {reason}")]
    Document { id: String, reason: String },

    #[error("Invalid export envelope: {0}")]
    Envelope(String),

    #[error("Cannot decode Firestore value: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a "not found" error from the API or the filesystem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
            || matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if the remote store rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    pub(crate) fn document(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Document {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
