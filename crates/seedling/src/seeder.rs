//! Writes the seed tables and verifies the result.

use std::fmt;

use futures::future::try_join_all;
use indexmap::IndexMap;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use seedling_core::emit;

use crate::dataset::{TableData, all_tables};
use crate::error::{QueryFailedSnafu, SeedError};
use crate::metrics::events::{TableVerified, TableWriteFailed, TableWritten};
use crate::schema::preview;
use crate::store::{TableIdent, TableStoreRef};

/// Row counts found by [`Seeder::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub schema: String,
    /// Every table present in the schema, sorted.
    pub tables: Vec<String>,
    /// Row count per verified table, in the order requested.
    pub counts: IndexMap<String, u64>,
}

impl VerificationReport {
    /// Row count of `table`, if it was verified.
    pub fn count(&self, table: &str) -> Option<u64> {
        self.counts.get(table).copied()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Tables in schema: {} ===", self.schema)?;
        for table in &self.tables {
            writeln!(f, "  {table}")?;
        }
        writeln!(f)?;
        writeln!(f, "=== Row counts ===")?;
        for (table, rows) in &self.counts {
            writeln!(f, "  {}.{table}: {rows} rows", self.schema)?;
        }
        Ok(())
    }
}

/// Outcome of a full [`Seeder::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Rows written per table, in write order.
    pub written: IndexMap<String, u64>,
    pub report: VerificationReport,
}

/// Overwrites fixed tables under one schema of a [`TableStore`](crate::store::TableStore).
pub struct Seeder {
    store: TableStoreRef,
    schema: String,
    concurrent_writes: bool,
}

impl Seeder {
    pub fn new(store: TableStoreRef, schema: impl Into<String>) -> Self {
        Self {
            store,
            schema: schema.into(),
            concurrent_writes: false,
        }
    }

    /// Write tables concurrently during [`run`](Self::run).
    pub fn with_concurrent_writes(mut self, concurrent: bool) -> Self {
        self.concurrent_writes = concurrent;
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Replace `schema.table` with exactly the rows of `table`.
    ///
    /// On success the written rows are printed to stdout as a table. Returns
    /// the number of rows written.
    pub async fn write_table(&self, table: &TableData) -> Result<u64, SeedError> {
        let ident = TableIdent::new(self.schema.as_str(), table.name());
        let batch = table.definition.to_record_batch(&table.rows)?;
        let rows = batch.num_rows() as u64;

        debug!(table = %ident, rows, "Overwriting table");
        if let Err(source) = self.store.overwrite(&ident, &batch).await {
            emit!(TableWriteFailed {
                table: ident.to_string(),
            });
            return Err(SeedError::WriteFailure {
                table: ident.to_string(),
                source,
            });
        }

        emit!(TableWritten {
            table: ident.to_string(),
            rows,
        });
        match &table.note {
            Some(note) => info!(table = %ident, "✓ {ident} created — {rows} rows ({note})"),
            None => info!(table = %ident, "✓ {ident} created — {rows} rows"),
        }
        match preview(&batch) {
            Ok(table) => println!("{table}"),
            Err(e) => warn!(table = %ident, error = %e, "Failed to render row preview"),
        }
        Ok(rows)
    }

    /// List the tables of the schema and count the rows of each named table.
    pub async fn verify(&self, table_names: &[&str]) -> Result<VerificationReport, SeedError> {
        let tables = self
            .store
            .list_tables(&self.schema)
            .await
            .context(QueryFailedSnafu {
                target: self.schema.clone(),
            })?;

        if tables.is_empty() {
            return Err(SeedError::MissingSchema {
                schema: self.schema.clone(),
            });
        }

        let mut counts = IndexMap::with_capacity(table_names.len());
        for &name in table_names {
            if !tables.iter().any(|t| t == name) {
                return Err(SeedError::MissingTable {
                    schema: self.schema.clone(),
                    table: name.to_string(),
                });
            }

            let ident = TableIdent::new(self.schema.as_str(), name);
            let rows = self.store.count(&ident).await.context(QueryFailedSnafu {
                target: ident.to_string(),
            })?;

            emit!(TableVerified {
                table: ident.to_string(),
                rows,
            });
            counts.insert(name.to_string(), rows);
        }

        Ok(VerificationReport {
            schema: self.schema.clone(),
            tables,
            counts,
        })
    }

    /// Write every table, then verify that each holds exactly the rows
    /// written by this run.
    pub async fn run(&self, tables: &[TableData]) -> Result<SeedSummary, SeedError> {
        info!(
            schema = %self.schema,
            concurrent = self.concurrent_writes,
            "Seeding {} table(s)",
            tables.len()
        );

        let rows = if self.concurrent_writes {
            try_join_all(tables.iter().map(|table| self.write_table(table))).await?
        } else {
            let mut rows = Vec::with_capacity(tables.len());
            for table in tables {
                rows.push(self.write_table(table).await?);
            }
            rows
        };

        let written: IndexMap<String, u64> = tables
            .iter()
            .map(|table| table.name().to_string())
            .zip(rows)
            .collect();

        let names: Vec<&str> = tables.iter().map(TableData::name).collect();
        let report = self.verify(&names).await?;

        for (table, &expected) in &written {
            let actual = report.count(table).unwrap_or_default();
            if actual != expected {
                return Err(SeedError::CountMismatch {
                    table: format!("{}.{table}", self.schema),
                    expected,
                    actual,
                });
            }
        }

        Ok(SeedSummary { written, report })
    }

    /// [`run`](Self::run) with the three fixed seed tables.
    pub async fn seed_all(&self) -> Result<SeedSummary, SeedError> {
        self.run(&all_tables()).await
    }
}
