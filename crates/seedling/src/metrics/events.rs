//! Internal events for seeding metrics.
//!
//! Every event carries a `table` label in `schema.table` form.

use metrics::{counter, gauge, histogram};
use std::time::Duration;
use tracing::trace;

use super::InternalEvent;

/// Event emitted when a Delta Lake commit completes.
pub struct DeltaCommitCompleted {
    pub duration: Duration,
    pub table: String,
}

impl InternalEvent for DeltaCommitCompleted {
    fn emit(self) {
        trace!(
            duration_ms = self.duration.as_millis(),
            table = %self.table,
            "Delta commit completed"
        );
        histogram!("seedling_delta_commit_duration_seconds", "table" => self.table)
            .record(self.duration.as_secs_f64());
    }
}

/// Event emitted when a table has been overwritten.
pub struct TableWritten {
    pub table: String,
    pub rows: u64,
}

impl InternalEvent for TableWritten {
    fn emit(self) {
        trace!(table = %self.table, rows = self.rows, "Table written");
        counter!("seedling_tables_written_total", "table" => self.table.clone()).increment(1);
        counter!("seedling_rows_written_total", "table" => self.table).increment(self.rows);
    }
}

/// Event emitted when an overwrite fails.
pub struct TableWriteFailed {
    pub table: String,
}

impl InternalEvent for TableWriteFailed {
    fn emit(self) {
        trace!(table = %self.table, "Table write failed");
        counter!("seedling_table_write_failures_total", "table" => self.table).increment(1);
    }
}

/// Event emitted with the row count observed during verification.
pub struct TableVerified {
    pub table: String,
    pub rows: u64,
}

impl InternalEvent for TableVerified {
    fn emit(self) {
        trace!(table = %self.table, rows = self.rows, "Table verified");
        gauge!("seedling_verified_rows", "table" => self.table).set(self.rows as f64);
    }
}
