//! Configuration for the export and import jobs.
//!
//! Default config location: ./firebridge.toml (optional)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::credentials::ServiceAccountKey;
use crate::error::{Error, Result};
use crate::export::ExportOptions;
use crate::import::{ConflictPolicy, ImportOptions};
use crate::store::firestore::DEFAULT_DATABASE;
use crate::store::FirestoreStore;

pub const DEFAULT_CONFIG_FILE: &str = "firebridge.toml";
const EMULATOR_PROJECT: &str = "demo-firebridge";

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirestoreConfig {
    /// Overrides the project id of the service-account key
    pub project_id: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_credentials")]
    pub credentials: PathBuf,
    /// `host:port` of a Firestore emulator; no credentials needed when set
    pub emulator_host: Option<String>,
    /// Environment variable holding the OAuth2 access token
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_credentials() -> PathBuf {
    PathBuf::from("service-account.json")
}

fn default_access_token_env() -> String {
    "FIRESTORE_ACCESS_TOKEN".to_string()
}

fn default_page_size() -> u32 {
    300
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database: default_database(),
            credentials: default_credentials(),
            emulator_host: None,
            access_token_env: default_access_token_env(),
            page_size: default_page_size(),
        }
    }
}

fn default_collection() -> String {
    "first_aid_procedures".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("first_aid_procedures.json")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_data_file")]
    pub output: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            output: default_data_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_data_file")]
    pub input: PathBuf,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            input: default_data_file(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    let home = || {
        dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
    };
    if let Some(rest) = s.strip_prefix("~/") {
        Ok(home()?.join(rest))
    } else if s == "~" {
        home()
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load `path` if given (it must exist), otherwise `./firebridge.toml`
    /// when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)
                } else {
                    let mut config = Config::default();
                    config.expand_paths()?;
                    Ok(config)
                }
            }
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.expand_paths()?;
        Ok(config)
    }

    fn expand_paths(&mut self) -> Result<()> {
        self.firestore.credentials = expand_tilde(&self.firestore.credentials)?;
        self.export.output = expand_tilde(&self.export.output)?;
        self.import.input = expand_tilde(&self.import.input)?;
        Ok(())
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            collection: self.export.collection.clone(),
            output_path: self.export.output.clone(),
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            collection: self.import.collection.clone(),
            input_path: self.import.input.clone(),
            conflict_policy: self.import.conflict_policy,
        }
    }
}

impl FirestoreConfig {
    /// Build a Firestore client, reading the access token from the process
    /// environment.
    pub fn open(&self) -> Result<FirestoreStore> {
        self.open_with_env(|name| std::env::var(name).ok())
    }

    /// Build a Firestore client with an explicit environment lookup.
    pub fn open_with_env(&self, env: impl Fn(&str) -> Option<String>) -> Result<FirestoreStore> {
        if let Some(host) = self.emulator_host.as_deref().filter(|h| !h.is_empty()) {
            let project_id = match &self.project_id {
                Some(project_id) => project_id.clone(),
                None if self.credentials.exists() => {
                    ServiceAccountKey::load(&self.credentials)?.project_id
                }
                None => EMULATOR_PROJECT.to_string(),
            };
            tracing::info!("Using Firestore emulator at {} (project {})", host, project_id);
            return FirestoreStore::emulator(host, &project_id, &self.database, self.page_size);
        }

        let key = ServiceAccountKey::load(&self.credentials)?;
        let project_id = self.project_id.clone().unwrap_or(key.project_id);

        let token = env(&self.access_token_env)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "No access token: set {} (e.g. from `gcloud auth print-access-token`)",
                    self.access_token_env
                ))
            })?;

        tracing::info!("Using Firestore project {} as {}", project_id, key.client_email);
        FirestoreStore::production(&project_id, &self.database, token, self.page_size)
    }
}
