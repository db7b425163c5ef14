//! Seedling: seeds the Bronze reference and fact tables into a Delta Lake schema.
//!
//! This crate handles:
//! - Validating fixed seed rows against explicit table definitions
//! - Overwriting `posting_type`, `cost_centre` and `journal_entry` under a target schema
//! - Verifying the schema listing and per-table row counts after the write

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod seeder;
pub mod store;

// Re-export commonly used items
pub use config::{CliArgs, Config};
pub use dataset::{TableData, all_tables};
pub use error::{RunError, SeedError, StoreError};
pub use seeder::{SeedSummary, Seeder, VerificationReport};
pub use store::{DeltaTableStore, MemoryTableStore, TableIdent, TableStore, TableStoreRef};

// Re-export from seedling-core
pub use seedling_core::{StorageProvider, StorageProviderRef, init_tracing};

use std::sync::Arc;

use tracing::info;

/// Seed the configured warehouse and return the run summary.
pub async fn run(config: &Config) -> Result<SeedSummary, RunError> {
    let storage = StorageProvider::for_url_with_options(
        &config.warehouse_uri,
        config.storage_options.clone(),
    )
    .await
    .map_err(|source| RunError::Warehouse { source })?;
    info!("Opened warehouse at {}", storage.root_url());

    let store: TableStoreRef = Arc::new(DeltaTableStore::new(Arc::new(storage)));
    let seeder =
        Seeder::new(store, config.schema.as_str()).with_concurrent_writes(config.concurrent_writes);

    Ok(seeder.seed_all().await?)
}
