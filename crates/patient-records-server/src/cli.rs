//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use patient_records_core::{BackendKind, SchemaVariant};
use std::path::PathBuf;

use crate::config::Config;

/// Patient record management server
#[derive(Parser, Debug)]
#[command(name = "patient-records", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API (default)
    Serve(ServeArgs),

    /// Create an empty patient document if none exists
    Init(StorageArgs),

    /// Validate every stored patient
    Check(CheckArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Default, Clone)]
pub struct StorageArgs {
    /// Data file (JSON) or database (SQLite)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Storage backend: json or sqlite
    #[arg(long)]
    pub backend: Option<BackendKind>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Schema variant: strict or api
    #[arg(long)]
    pub variant: Option<SchemaVariant>,

    /// Create an empty document at startup if none exists
    #[arg(long)]
    pub create_missing: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Schema variant: strict or api
    #[arg(long)]
    pub variant: Option<SchemaVariant>,
}

impl StorageArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(data) = &self.data {
            config.storage.path = data.clone();
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
    }
}

impl ServeArgs {
    pub fn apply(&self, config: &mut Config) {
        self.storage.apply(config);
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(variant) = self.variant {
            config.schema.variant = variant;
        }
        if self.create_missing {
            config.storage.create_if_missing = true;
        }
    }
}

impl CheckArgs {
    pub fn apply(&self, config: &mut Config) {
        self.storage.apply(config);
        if let Some(variant) = self.variant {
            config.schema.variant = variant;
        }
    }
}
