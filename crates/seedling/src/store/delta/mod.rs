//! Delta Lake table store.
//!
//! Tables live at `{warehouse}/{schema}/{table}`. An overwrite uploads one
//! Parquet data file holding the new rows, then commits a single version with
//! the new metadata, a remove for every previous file and an add for the new
//! one. Readers see either the old table or the new one. Listing looks for
//! `_delta_log` directories one level below the schema prefix; counting reads
//! the row counts from the Parquet footers of the files in the current
//! snapshot.

mod actions;
mod table;

use std::collections::BTreeSet;
use std::time::Instant;

use async_trait::async_trait;
use deltalake::DeltaTable;
use deltalake::arrow::array::RecordBatch;
use deltalake::kernel::Action;
use object_store::path::Path;
use snafu::prelude::*;
use tracing::{debug, info};

use seedling_core::{StorageProviderRef, emit};

use super::{TableIdent, TableStore};
use crate::error::{DeltaOperationSnafu, StorageSnafu, StoreError};
use crate::metrics::events::DeltaCommitCompleted;

use actions::{create_add_action, data_file_name, encode_parquet, parquet_row_count};
use table::{create_or_replace_table, ensure_handlers_registered, open_table};

/// Name of the transaction log directory inside a Delta table.
const DELTA_LOG_DIR: &str = "_delta_log";

/// Table store backed by Delta Lake tables below a warehouse root.
#[derive(Debug, Clone)]
pub struct DeltaTableStore {
    storage: StorageProviderRef,
}

impl DeltaTableStore {
    pub fn new(storage: StorageProviderRef) -> Self {
        ensure_handlers_registered();
        Self { storage }
    }

    /// Upload `batch` as one data file and return its Add action.
    async fn upload_data_file(
        &self,
        table: &TableIdent,
        batch: &RecordBatch,
    ) -> Result<Action, StoreError> {
        let file_name = data_file_name();
        let bytes = encode_parquet(batch)?;
        let size = bytes.len();

        let path = Path::from(format!("{}/{file_name}", table.relative_path()));
        self.storage
            .put_parquet(&path, bytes)
            .await
            .context(StorageSnafu)?;

        create_add_action(&file_name, size, batch.num_rows())
    }

    /// Paths of the data files in the current snapshot, relative to the
    /// warehouse root.
    fn data_file_paths(
        &self,
        delta_table: &DeltaTable,
        table: &TableIdent,
    ) -> Result<Vec<String>, StoreError> {
        let root = delta_table.table_uri();
        let root = root.trim_end_matches('/');

        delta_table
            .get_file_uris()
            .context(DeltaOperationSnafu)?
            .map(|uri| {
                uri.strip_prefix(root)
                    .map(|rest| rest.trim_start_matches('/'))
                    .filter(|rest| !rest.is_empty())
                    .map(|relative| format!("{}/{relative}", table.relative_path()))
                    .ok_or_else(|| StoreError::FileOutsideTable {
                        uri: uri.clone(),
                        root: root.to_string(),
                    })
            })
            .collect()
    }
}

#[async_trait]
impl TableStore for DeltaTableStore {
    async fn overwrite(&self, table: &TableIdent, batch: &RecordBatch) -> Result<(), StoreError> {
        let actions = if batch.num_rows() == 0 {
            debug!(table = %table, "No rows to write, table left empty");
            Vec::new()
        } else {
            vec![self.upload_data_file(table, batch).await?]
        };

        let start = Instant::now();
        let delta_table =
            create_or_replace_table(&self.storage, table, &batch.schema(), actions).await?;

        emit!(DeltaCommitCompleted {
            duration: start.elapsed(),
            table: table.to_string(),
        });

        info!(
            table = %table,
            "Committed {} rows to Delta Lake, version {}",
            batch.num_rows(),
            delta_table.version().unwrap_or(-1)
        );
        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, StoreError> {
        let paths = self.storage.list_prefix(schema).await.context(StorageSnafu)?;

        let tables: BTreeSet<String> = paths
            .iter()
            .filter_map(|path| {
                let parts: Vec<String> = path.parts().map(|p| p.as_ref().to_string()).collect();
                match parts.as_slice() {
                    [first, name, log, ..] if first == schema && log == DELTA_LOG_DIR => {
                        Some(name.clone())
                    }
                    _ => None,
                }
            })
            .collect();

        Ok(tables.into_iter().collect())
    }

    async fn count(&self, table: &TableIdent) -> Result<u64, StoreError> {
        let delta_table = open_table(&self.storage, table).await?;

        let mut rows = 0;
        for path in self.data_file_paths(&delta_table, table)? {
            let bytes = self.storage.get(path).await.context(StorageSnafu)?;
            rows += parquet_row_count(bytes)?;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::array::{Int32Array, StringArray};
    use deltalake::arrow::datatypes::{DataType, Field, Schema};
    use seedling_core::StorageProvider;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> DeltaTableStore {
        let storage =
            StorageProvider::for_url_with_options(dir.path().to_str().unwrap(), HashMap::new())
                .await
                .unwrap();
        DeltaTableStore::new(Arc::new(storage))
    }

    fn ids(values: &[i32]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values.to_vec()))]).unwrap()
    }

    #[tokio::test]
    async fn test_overwrite_then_count() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let table = TableIdent::new("dbo", "posting_type");

        store.overwrite(&table, &ids(&[1, 2, 3, 4, 5])).await.unwrap();
        assert_eq!(store.count(&table).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_second_overwrite_replaces_rows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let table = TableIdent::new("dbo", "posting_type");

        store.overwrite(&table, &ids(&[1, 2, 3, 4, 5])).await.unwrap();
        store.overwrite(&table, &ids(&[1, 2])).await.unwrap();

        assert_eq!(store.count(&table).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_each_overwrite_commits_one_version() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let table = TableIdent::new("dbo", "posting_type");

        let runs: [&[i32]; 3] = [&[1, 2, 3, 4, 5], &[1, 2], &[]];
        for (run, rows) in runs.into_iter().enumerate() {
            store.overwrite(&table, &ids(rows)).await.unwrap();
            let latest = open_table(&store.storage, &table).await.unwrap();
            assert_eq!(latest.version(), Some(run as i64));
        }

        let url = table::table_url(&store.storage, &table).unwrap();
        for (version, live_files) in [1, 1, 0].into_iter().enumerate() {
            let snapshot = deltalake::open_table_with_version(url.as_str(), version as i64)
                .await
                .unwrap();
            assert_eq!(
                snapshot.get_file_uris().unwrap().count(),
                live_files,
                "version {version}"
            );
        }
    }

    #[tokio::test]
    async fn test_overwrite_replaces_schema() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let table = TableIdent::new("dbo", "cost_centre");

        store.overwrite(&table, &ids(&[1, 2, 3])).await.unwrap();

        let schema = Arc::new(Schema::new(vec![Field::new("code", DataType::Utf8, true)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["CC001"]))])
                .unwrap();
        store.overwrite(&table, &batch).await.unwrap();

        assert_eq!(store.count(&table).await.unwrap(), 1);
        let delta_table = open_table(&store.storage, &table).await.unwrap();
        let snapshot = delta_table.snapshot().unwrap();
        let names: Vec<_> = snapshot
            .schema()
            .fields()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["code"]);
    }

    #[tokio::test]
    async fn test_empty_overwrite_leaves_empty_table() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let table = TableIdent::new("dbo", "journal_entry");

        store.overwrite(&table, &ids(&[1, 2, 3])).await.unwrap();
        store.overwrite(&table, &ids(&[])).await.unwrap();

        assert_eq!(store.count(&table).await.unwrap(), 0);
        assert_eq!(store.list_tables("dbo").await.unwrap(), vec!["journal_entry"]);
    }

    #[tokio::test]
    async fn test_list_tables() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        assert!(store.list_tables("dbo").await.unwrap().is_empty());

        for name in ["posting_type", "cost_centre"] {
            store
                .overwrite(&TableIdent::new("dbo", name), &ids(&[1]))
                .await
                .unwrap();
        }
        store
            .overwrite(&TableIdent::new("silver", "posting_type"), &ids(&[1]))
            .await
            .unwrap();

        assert_eq!(
            store.list_tables("dbo").await.unwrap(),
            vec!["cost_centre", "posting_type"]
        );
        assert_eq!(store.list_tables("silver").await.unwrap(), vec!["posting_type"]);
    }

    #[tokio::test]
    async fn test_count_missing_table() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let err = store
            .count(&TableIdent::new("dbo", "missing"))
            .await
            .unwrap_err();
        assert!(err.is_table_not_found(), "{err:?}");
    }
}
