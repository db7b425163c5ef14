//! seedling-core: plumbing shared by the seedling seeder.
//!
//! - `storage/` - object store access for the warehouse root (S3, GCS, Azure, local)
//! - `config/` - YAML loading with environment variable interpolation
//! - `metrics/` - storage metric events
//! - `error` - storage and configuration errors
//! - `tracing` - subscriber setup for the binary

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod tracing;

pub use config::{interpolate, load_yaml_file, parse_yaml};
pub use error::{ConfigError, StorageError};
pub use storage::{BackendConfig, StorageProvider, StorageProviderRef};
pub use self::tracing::init_tracing;
