//! Error types for the seeder.

use snafu::prelude::*;

pub use seedling_core::error::{ConfigError, StorageError};

/// Errors raised by a [`TableStore`](crate::store::TableStore) backend.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// Storage error.
    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },

    /// Delta Lake operation failed.
    #[snafu(display("Delta Lake operation failed: {source}"))]
    DeltaOperation { source: deltalake::DeltaTableError },

    /// Failed to convert the Arrow schema to a Delta schema.
    #[snafu(display("Failed to convert schema: {source}"))]
    SchemaConversion {
        source: deltalake::arrow::error::ArrowError,
    },

    /// Failed to encode or read a Parquet data file.
    #[snafu(display("Parquet error: {source}"))]
    Parquet {
        source: deltalake::parquet::errors::ParquetError,
    },

    /// A Parquet footer recorded a negative row count.
    #[snafu(display("Parquet footer records an invalid row count of {rows}"))]
    InvalidRowCount { rows: i64 },

    /// Failed to encode file statistics.
    #[snafu(display("Failed to encode file statistics: {source}"))]
    StatsEncode { source: serde_json::Error },

    /// Failed to parse a Delta table URL.
    #[snafu(display("Failed to parse Delta table URL: {url}"))]
    UrlParse { url: String },

    /// A data file URI did not resolve below its table root.
    #[snafu(display("Data file {uri} is outside table root {root}"))]
    FileOutsideTable { uri: String, root: String },

    /// Table does not exist.
    #[snafu(display("Table {table} does not exist"))]
    TableNotFound { table: String },

    /// Write rejected by the store.
    #[snafu(display("Write to {table} rejected: {reason}"))]
    Rejected { table: String, reason: String },
}

impl StoreError {
    /// Whether the error means the table itself is absent.
    pub fn is_table_not_found(&self) -> bool {
        match self {
            StoreError::TableNotFound { .. } => true,
            StoreError::DeltaOperation { source } => matches!(
                source,
                deltalake::DeltaTableError::NotATable(_)
                    | deltalake::DeltaTableError::InvalidTableLocation(_)
            ),
            _ => false,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(source: StorageError) -> Self {
        StoreError::Storage { source }
    }
}

/// Errors that abort a seeding run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SeedError {
    /// A record does not conform to its table definition.
    #[snafu(display("Schema violation in {table}: {reason}"))]
    SchemaViolation { table: String, reason: String },

    /// The store could not complete an overwrite.
    #[snafu(display("Write failure for {table}: {source}"))]
    WriteFailure { table: String, source: StoreError },

    /// Target schema has no tables after the write phase.
    #[snafu(display("Lookup failure: schema '{schema}' does not exist"))]
    MissingSchema { schema: String },

    /// A written table is absent from the schema listing.
    #[snafu(display("Lookup failure: table '{table}' not found in schema '{schema}'"))]
    MissingTable { schema: String, table: String },

    /// Listing or counting failed.
    #[snafu(display("Lookup failure: query on {target} failed: {source}"))]
    QueryFailed { target: String, source: StoreError },

    /// Verified count disagrees with the rows written in this run.
    #[snafu(display(
        "Lookup failure: {table} has {actual} rows after writing {expected}"
    ))]
    CountMismatch {
        table: String,
        expected: u64,
        actual: u64,
    },
}

impl SeedError {
    /// Whether the error was raised by post-write verification.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            SeedError::MissingSchema { .. }
                | SeedError::MissingTable { .. }
                | SeedError::QueryFailed { .. }
                | SeedError::CountMismatch { .. }
        )
    }
}

/// Top-level errors of the binary.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RunError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Failed to open the warehouse.
    #[snafu(display("Failed to open warehouse: {source}"))]
    Warehouse { source: StorageError },

    /// Seeding failed.
    #[snafu(display("Seeding failed: {source}"))]
    Seed { source: SeedError },
}

impl From<ConfigError> for RunError {
    fn from(source: ConfigError) -> Self {
        RunError::Config { source }
    }
}

impl From<SeedError> for RunError {
    fn from(source: SeedError) -> Self {
        RunError::Seed { source }
    }
}
