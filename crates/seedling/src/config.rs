//! Seeder configuration and command line arguments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::Parser;
use regex::Regex;
use serde::{Deserialize, Serialize};

use seedling_core::config::{load_yaml_file, parse_yaml};
use seedling_core::error::ConfigError;

/// Schema the tables are written to when none is configured.
pub const DEFAULT_SCHEMA: &str = "dbo";

static SCHEMA_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid schema name regex"));

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// Seeder configuration.
///
/// # Example
///
/// ```yaml
/// schema: dbo
/// warehouse_uri: abfss://workspace@onelake.dfs.fabric.microsoft.com/Bronze.Lakehouse/Tables
/// storage_options:
///   azure_client_id: ${AZURE_CLIENT_ID}
/// concurrent_writes: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Target schema the seed tables are written under.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Root of the warehouse holding one directory per schema.
    #[serde(default)]
    pub warehouse_uri: String,
    /// Options passed to Delta Lake and the object store.
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
    /// Write the tables concurrently instead of one after another.
    #[serde(default)]
    pub concurrent_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            warehouse_uri: String::new(),
            storage_options: HashMap::new(),
            concurrent_writes: false,
        }
    }
}

impl Config {
    /// Parse configuration from a YAML string. Not validated.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        parse_yaml(contents)
    }

    /// Load configuration from a YAML file. Not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_yaml_file(path)
    }

    /// Resolve the effective configuration from command line arguments.
    ///
    /// Starts from the config file when one is given, otherwise from the
    /// defaults, then applies flag overrides and validates the result.
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides.
    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(schema) = &args.schema {
            self.schema = schema.clone();
        }
        if let Some(warehouse) = &args.warehouse {
            self.warehouse_uri = warehouse.clone();
        }
        if args.concurrent {
            self.concurrent_writes = true;
        }
    }

    /// Validate the configuration.
    ///
    /// Checks:
    /// - `warehouse_uri` is not blank
    /// - `schema` is a plain identifier
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.warehouse_uri.trim().is_empty() {
            return Err(ConfigError::EmptyWarehouseUri);
        }

        if !SCHEMA_NAME.is_match(&self.schema) {
            return Err(ConfigError::InvalidSchemaName {
                schema: self.schema.clone(),
            });
        }

        Ok(())
    }
}

#[derive(Parser, Debug, Default)]
#[command(version, about = "Seed the Bronze tables into a Delta Lake schema")]
pub struct CliArgs {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target schema, overrides the config file
    #[arg(long)]
    pub schema: Option<String>,

    /// Warehouse root URI or absolute path, overrides the config file
    #[arg(long)]
    pub warehouse: Option<String>,

    /// Write the tables concurrently
    #[arg(long)]
    pub concurrent: bool,
}
