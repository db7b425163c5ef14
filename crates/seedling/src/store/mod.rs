//! Table stores.
//!
//! A [`TableStore`] owns a set of named tables grouped by schema and supports
//! the three things seeding needs: replace a table wholesale, list the tables
//! of a schema, and count the rows of a table.
//!
//! - [`DeltaTableStore`] writes Delta Lake tables below a warehouse root.
//! - [`MemoryTableStore`] keeps batches in memory and can be told to fail.

mod delta;
mod memory;

pub use delta::DeltaTableStore;
pub use memory::MemoryTableStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deltalake::arrow::array::RecordBatch;

use crate::error::StoreError;

/// Reference-counted table store.
pub type TableStoreRef = Arc<dyn TableStore>;

/// A table name qualified by its schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableIdent {
    pub schema: String,
    pub name: String,
}

impl TableIdent {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Location of the table relative to the warehouse root.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.schema, self.name)
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Storage backend for seeded tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Replace `table` with exactly the rows of `batch`.
    ///
    /// Any existing contents and schema of the table are discarded. An empty
    /// batch leaves an empty table carrying the batch schema.
    async fn overwrite(&self, table: &TableIdent, batch: &RecordBatch) -> Result<(), StoreError>;

    /// Names of the tables in `schema`, sorted. An unknown schema has none.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, StoreError>;

    /// Number of rows in `table`.
    async fn count(&self, table: &TableIdent) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ident_display_and_path() {
        let ident = TableIdent::new("dbo", "journal_entry");
        assert_eq!(ident.to_string(), "dbo.journal_entry");
        assert_eq!(ident.relative_path(), "dbo/journal_entry");
    }
}
