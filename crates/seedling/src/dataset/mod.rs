//! The fixed Bronze seed datasets.
//!
//! Each table is a typed record with a [`SeedTable`] impl that supplies the
//! table name, its field definition and the literal seed rows. Several rows
//! are deliberately "dirty" (an inactive lookup entry, a null amount) because
//! the downstream views filter on them; they must stay as they are.

mod cost_centre;
mod journal_entry;
mod posting_type;

pub use cost_centre::CostCentre;
pub use journal_entry::JournalEntry;
pub use posting_type::PostingType;

use chrono::{NaiveDate, NaiveDateTime};

use crate::schema::{Row, TableDefinition};

/// A table with a fixed set of seed rows.
pub trait SeedTable: Sized {
    /// Table name inside the target schema.
    const TABLE_NAME: &'static str;

    /// Ordered field definition.
    fn definition() -> TableDefinition;

    /// The literal seed rows.
    fn seed_rows() -> Vec<Self>;

    /// Values of this record in field order.
    fn to_row(&self) -> Row;

    /// Optional remark logged next to the write confirmation.
    fn note(_rows: &[Self]) -> Option<String> {
        None
    }

    /// Definition and rows ready for writing.
    fn table_data() -> TableData {
        let records = Self::seed_rows();
        TableData {
            definition: Self::definition(),
            rows: records.iter().map(Self::to_row).collect(),
            note: Self::note(&records),
        }
    }
}

/// A table definition together with the rows to write into it.
#[derive(Debug, Clone)]
pub struct TableData {
    pub definition: TableDefinition,
    pub rows: Vec<Row>,
    pub note: Option<String>,
}

impl TableData {
    pub fn new(definition: TableDefinition, rows: Vec<Row>) -> Self {
        Self {
            definition,
            rows,
            note: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }
}

/// Names of the seeded tables, in write order.
pub const TABLE_NAMES: [&str; 3] = [
    PostingType::TABLE_NAME,
    CostCentre::TABLE_NAME,
    JournalEntry::TABLE_NAME,
];

/// All three seed tables, in write order.
pub fn all_tables() -> Vec<TableData> {
    vec![
        PostingType::table_data(),
        CostCentre::table_data(),
        JournalEntry::table_data(),
    ]
}

/// Calendar date of a seed row. Only called with literal, valid dates.
pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("seed dates are valid calendar dates")
}

/// Midnight on the given date.
pub(crate) fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    date(year, month, day).and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_order_and_names() {
        let names: Vec<_> = all_tables().iter().map(TableData::name).collect();
        assert_eq!(names, TABLE_NAMES);
        assert_eq!(names, ["posting_type", "cost_centre", "journal_entry"]);
    }

    #[test]
    fn test_row_counts() {
        let counts: Vec<_> = all_tables().iter().map(|t| t.rows.len()).collect();
        assert_eq!(counts, [5, 6, 11]);
    }

    #[test]
    fn test_all_seed_rows_conform_to_definitions() {
        for table in all_tables() {
            table
                .definition
                .validate(&table.rows)
                .unwrap_or_else(|e| panic!("{}: {e}", table.name()));
        }
    }

    #[test]
    fn test_journal_entries_reference_existing_lookups() {
        let posting_types: HashSet<i32> = PostingType::seed_rows()
            .iter()
            .map(|p| p.posting_type_id)
            .collect();
        let cost_centres: HashSet<i32> = CostCentre::seed_rows()
            .iter()
            .map(|c| c.cost_centre_id)
            .collect();

        for entry in JournalEntry::seed_rows() {
            if let Some(id) = entry.posting_type_id {
                assert!(
                    posting_types.contains(&id),
                    "entry {} references unknown posting type {id}",
                    entry.journal_entry_id
                );
            }
            if let Some(id) = entry.cost_centre_id {
                assert!(
                    cost_centres.contains(&id),
                    "entry {} references unknown cost centre {id}",
                    entry.journal_entry_id
                );
            }
        }
    }

    #[test]
    fn test_midnight() {
        assert_eq!(midnight(2024, 1, 1).to_string(), "2024-01-01 00:00:00");
    }
}
