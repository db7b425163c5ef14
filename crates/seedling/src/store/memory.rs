//! In-memory table store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use deltalake::arrow::array::RecordBatch;
use tokio::sync::RwLock;
use tracing::debug;

use super::{TableIdent, TableStore};
use crate::error::StoreError;

/// Keeps every table as a single record batch.
///
/// Writes to tables registered with [`fail_writes_to`](Self::fail_writes_to)
/// are rejected.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    schemas: RwLock<HashMap<String, BTreeMap<String, RecordBatch>>>,
    failing: RwLock<HashMap<TableIdent, String>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future write to `table` with `reason`.
    pub async fn fail_writes_to(&self, table: TableIdent, reason: impl Into<String>) {
        self.failing.write().await.insert(table, reason.into());
    }

    /// Remove a single table.
    pub async fn drop_table(&self, table: &TableIdent) {
        if let Some(tables) = self.schemas.write().await.get_mut(&table.schema) {
            tables.remove(&table.name);
        }
    }

    /// Copy of the stored batch for `table`.
    pub async fn batch(&self, table: &TableIdent) -> Option<RecordBatch> {
        self.schemas
            .read()
            .await
            .get(&table.schema)
            .and_then(|tables| tables.get(&table.name))
            .cloned()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn overwrite(&self, table: &TableIdent, batch: &RecordBatch) -> Result<(), StoreError> {
        if let Some(reason) = self.failing.read().await.get(table) {
            return Err(StoreError::Rejected {
                table: table.to_string(),
                reason: reason.clone(),
            });
        }

        self.schemas
            .write()
            .await
            .entry(table.schema.clone())
            .or_default()
            .insert(table.name.clone(), batch.clone());
        debug!(table = %table, rows = batch.num_rows(), "Replaced in-memory table");
        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .schemas
            .read()
            .await
            .get(schema)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, table: &TableIdent) -> Result<u64, StoreError> {
        self.batch(table)
            .await
            .map(|batch| batch.num_rows() as u64)
            .ok_or_else(|| StoreError::TableNotFound {
                table: table.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::array::Int32Array;
    use deltalake::arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch(ids: &[i32]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(ids.to_vec()))]).unwrap()
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let store = MemoryTableStore::new();
        let table = TableIdent::new("dbo", "posting_type");

        store.overwrite(&table, &batch(&[1, 2, 3])).await.unwrap();
        store.overwrite(&table, &batch(&[4])).await.unwrap();

        assert_eq!(store.count(&table).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_tables_sorted_per_schema() {
        let store = MemoryTableStore::new();
        store
            .overwrite(&TableIdent::new("dbo", "posting_type"), &batch(&[1]))
            .await
            .unwrap();
        store
            .overwrite(&TableIdent::new("dbo", "cost_centre"), &batch(&[1]))
            .await
            .unwrap();
        store
            .overwrite(&TableIdent::new("staging", "other"), &batch(&[1]))
            .await
            .unwrap();

        assert_eq!(
            store.list_tables("dbo").await.unwrap(),
            vec!["cost_centre", "posting_type"]
        );
        assert!(store.list_tables("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_missing_table() {
        let store = MemoryTableStore::new();
        let err = store
            .count(&TableIdent::new("dbo", "journal_entry"))
            .await
            .unwrap_err();
        assert!(err.is_table_not_found());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_table_untouched() {
        let store = MemoryTableStore::new();
        let table = TableIdent::new("dbo", "cost_centre");
        store.overwrite(&table, &batch(&[1, 2])).await.unwrap();

        store.fail_writes_to(table.clone(), "permission denied").await;
        let err = store.overwrite(&table, &batch(&[3])).await.unwrap_err();

        assert!(matches!(err, StoreError::Rejected { .. }));
        assert_eq!(store.count(&table).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drop_table() {
        let store = MemoryTableStore::new();
        let table = TableIdent::new("dbo", "cost_centre");
        store.overwrite(&table, &batch(&[1])).await.unwrap();

        store.drop_table(&table).await;
        assert!(store.list_tables("dbo").await.unwrap().is_empty());
    }
}
