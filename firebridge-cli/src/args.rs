use anyhow::{Context, Result};
use clap::{Args, Parser};
use firebridge::{ConflictPolicy, Config};
use std::path::PathBuf;

/// Options shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Config file (default: ./firebridge.toml if present)
    #[arg(short, long, env = "FIREBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service-account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Firestore project id (defaults to the key's project_id)
    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    pub project: Option<String>,

    /// Firestore database id
    #[arg(long)]
    pub database: Option<String>,

    /// Talk to a Firestore emulator at host:port instead of production
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    /// Collection name
    #[arg(long)]
    pub collection: Option<String>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

impl CommonArgs {
    /// Load the config file and apply the connection overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load config")?;

        let firestore = &mut config.firestore;
        if let Some(credentials) = &self.credentials {
            firestore.credentials = credentials.clone();
        }
        if let Some(project) = &self.project {
            firestore.project_id = Some(project.clone());
        }
        if let Some(database) = &self.database {
            firestore.database = database.clone();
        }
        if let Some(host) = &self.emulator_host {
            firestore.emulator_host = Some(host.clone());
        }

        Ok(config)
    }
}

#[derive(Parser, Debug)]
#[command(name = "firebridge-export")]
#[command(about = "Export a Firestore collection to a JSON file")]
#[command(version)]
pub struct ExportCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output JSON file (overwritten if it exists)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportCli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = self.common.load_config()?;
        if let Some(collection) = &self.common.collection {
            config.export.collection = collection.clone();
        }
        if let Some(output) = &self.output {
            config.export.output = output.clone();
        }
        Ok(config)
    }
}

#[derive(Parser, Debug)]
#[command(name = "firebridge-import")]
#[command(about = "Import documents from a JSON export file into a Firestore collection")]
#[command(version)]
pub struct ImportCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Input JSON file produced by firebridge-export
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Leave documents that already exist untouched
    #[arg(long, conflicts_with = "overwrite")]
    pub skip_existing: bool,

    /// Merge file fields into existing documents (default)
    #[arg(long)]
    pub overwrite: bool,
}

impl ImportCli {
    /// Conflict policy chosen on the command line, if any.
    pub fn conflict_policy(&self) -> Option<ConflictPolicy> {
        if self.skip_existing {
            Some(ConflictPolicy::Skip)
        } else if self.overwrite {
            Some(ConflictPolicy::Overwrite)
        } else {
            None
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = self.common.load_config()?;
        if let Some(collection) = &self.common.collection {
            config.import.collection = collection.clone();
        }
        if let Some(input) = &self.input {
            config.import.input = input.clone();
        }
        if let Some(policy) = self.conflict_policy() {
            config.import.conflict_policy = policy;
        }
        Ok(config)
    }
}
