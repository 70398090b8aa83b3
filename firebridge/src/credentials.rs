//! Service-account key loading.
//!
//! Only the identifying fields are read. Turning the key into an access
//! token happens outside this crate (e.g. `gcloud auth print-access-token`).

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    #[serde(default)]
    pub client_email: String,
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content).map_err(|reason| Error::Credentials {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let key: ServiceAccountKey = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if key.key_type != "service_account" {
            return Err(format!(
                "expected type 'service_account', found '{}'",
                key.key_type
            ));
        }
        if key.project_id.trim().is_empty() {
            return Err("project_id is empty".to_string());
        }
        Ok(key)
    }
}
