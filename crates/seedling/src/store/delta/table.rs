//! Delta Lake table creation and loading.

use deltalake::DeltaTable;
use deltalake::arrow::datatypes::Schema;
use deltalake::kernel::Action;
use deltalake::operations::create::CreateBuilder;
use deltalake::protocol::SaveMode;
use snafu::prelude::*;
use tracing::{debug, info};
use url::Url;

use seedling_core::StorageProvider;
use seedling_core::error::IoSnafu;

use super::super::TableIdent;
use crate::error::{DeltaOperationSnafu, StoreError, StorageSnafu};

/// Register the Delta Lake cloud storage handlers.
///
/// Idempotent.
pub fn ensure_handlers_registered() {
    deltalake::aws::register_handlers(None);
    deltalake::gcp::register_handlers(None);
    deltalake::azure::register_handlers(None);
}

/// Convert an Arrow schema to a Delta schema.
pub fn arrow_schema_to_delta(schema: &Schema) -> Result<deltalake::kernel::StructType, StoreError> {
    use deltalake::kernel::engine::arrow_conversion::TryIntoKernel;
    use deltalake::kernel::{DataType as DeltaType, StructField, StructType};

    let fields = schema
        .fields()
        .iter()
        .map(|field| -> Result<StructField, StoreError> {
            let delta_type: DeltaType = field
                .data_type()
                .try_into_kernel()
                .map_err(|source| StoreError::SchemaConversion { source })?;
            Ok(StructField::new(
                field.name(),
                delta_type,
                field.is_nullable(),
            ))
        });

    StructType::try_new(fields)
}

/// Delta table URL of `table` below the storage root.
pub fn table_url(storage: &StorageProvider, table: &TableIdent) -> Result<Url, StoreError> {
    let url = storage.url_for(&table.relative_path());
    Url::parse(&url).map_err(|_| StoreError::UrlParse { url })
}

/// Create `table` with `schema` and `actions`, replacing any table already at
/// its location.
///
/// Everything lands in one commit: the metadata carrying the new schema, a
/// remove for every data file of the previous version, and `actions`.
pub async fn create_or_replace_table(
    storage: &StorageProvider,
    table: &TableIdent,
    schema: &Schema,
    actions: Vec<Action>,
) -> Result<DeltaTable, StoreError> {
    let url = table_url(storage, table)?;

    if let Some(dir) = storage.local_dir_for(&table.relative_path()) {
        tokio::fs::create_dir_all(&dir)
            .await
            .context(IoSnafu)
            .context(StorageSnafu)?;
    }

    let delta_schema = arrow_schema_to_delta(schema)?;
    debug!(table = %table, location = %url, "Creating or replacing Delta table");

    let delta_table = CreateBuilder::new()
        .with_location(url.as_str())
        .with_table_name(&table.name)
        .with_columns(delta_schema.fields().cloned())
        .with_actions(actions)
        .with_storage_options(storage.storage_options().clone())
        .with_save_mode(SaveMode::Overwrite)
        .await
        .context(DeltaOperationSnafu)?;

    info!(
        table = %table,
        "Delta table replaced at version {}",
        delta_table.version().unwrap_or(-1)
    );
    Ok(delta_table)
}

/// Open an existing Delta table.
///
/// Fails with an error for which [`StoreError::is_table_not_found`] holds when
/// there is no table at the location.
pub async fn open_table(
    storage: &StorageProvider,
    table: &TableIdent,
) -> Result<DeltaTable, StoreError> {
    let url = table_url(storage, table)?;
    let delta_table =
        deltalake::open_table_with_storage_options(url, storage.storage_options().clone())
            .await
            .context(DeltaOperationSnafu)?;

    debug!(
        table = %table,
        "Opened Delta table at version {}",
        delta_table.version().unwrap_or(-1)
    );
    Ok(delta_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::datatypes::{DataType, Field, TimeUnit};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_arrow_schema_to_delta_keeps_nullability() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new(
                "created_date",
                DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
                true,
            ),
        ]);

        let delta = arrow_schema_to_delta(&schema).unwrap();
        let fields: Vec<_> = delta.fields().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "id");
        assert!(!fields[0].is_nullable());
        assert!(fields[1].is_nullable());
    }

    #[test]
    fn test_arrow_schema_to_delta_rejects_unsupported_type() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("elapsed", DataType::Duration(TimeUnit::Second), true),
        ]);

        let err = arrow_schema_to_delta(&schema).unwrap_err();
        assert!(matches!(err, StoreError::SchemaConversion { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_open_missing_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage =
            StorageProvider::for_url_with_options(dir.path().to_str().unwrap(), HashMap::new())
                .await
                .unwrap();

        let err = open_table(&storage, &TableIdent::new("dbo", "posting_type"))
            .await
            .unwrap_err();
        assert!(err.is_table_not_found(), "{err:?}");
    }

    #[tokio::test]
    async fn test_create_then_replace_bumps_version() {
        let dir = TempDir::new().unwrap();
        let storage =
            StorageProvider::for_url_with_options(dir.path().to_str().unwrap(), HashMap::new())
                .await
                .unwrap();
        let ident = TableIdent::new("dbo", "cost_centre");
        let schema = Schema::new(vec![Field::new("id", DataType::Int32, false)]);

        let first = create_or_replace_table(&storage, &ident, &schema, Vec::new())
            .await
            .unwrap();
        assert_eq!(first.version(), Some(0));

        let second = create_or_replace_table(&storage, &ident, &schema, Vec::new())
            .await
            .unwrap();
        assert_eq!(second.version(), Some(1));
        assert!(dir.path().join("dbo/cost_centre/_delta_log").is_dir());
    }
}
