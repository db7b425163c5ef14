//! `journal_entry`: transactional fact rows.

use chrono::{NaiveDate, NaiveDateTime};

use super::{SeedTable, date};
use crate::schema::{FieldDef, FieldType, Row, TableDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub journal_entry_id: i32,
    pub journal_date: NaiveDate,
    pub posting_type_id: Option<i32>,
    pub cost_centre_id: Option<i32>,
    pub amount: Option<f64>,
    pub currency_code: Option<&'static str>,
    pub description: Option<&'static str>,
    pub created_date: Option<NaiveDateTime>,
    pub modified_date: Option<NaiveDateTime>,
}

impl JournalEntry {
    /// An entry booked on `journal_date`, stamped at midnight of that day.
    fn booked(
        id: i32,
        journal_date: NaiveDate,
        posting_type_id: i32,
        cost_centre_id: i32,
        amount: Option<f64>,
        currency_code: &'static str,
        description: &'static str,
    ) -> Self {
        let stamp = journal_date.and_time(chrono::NaiveTime::MIN);
        Self {
            journal_entry_id: id,
            journal_date,
            posting_type_id: Some(posting_type_id),
            cost_centre_id: Some(cost_centre_id),
            amount,
            currency_code: Some(currency_code),
            description: Some(description),
            created_date: Some(stamp),
            modified_date: Some(stamp),
        }
    }
}

impl SeedTable for JournalEntry {
    const TABLE_NAME: &'static str = "journal_entry";

    fn definition() -> TableDefinition {
        TableDefinition::new(
            Self::TABLE_NAME,
            vec![
                FieldDef::required("journal_entry_id", FieldType::Int32),
                FieldDef::required("journal_date", FieldType::Date),
                FieldDef::optional("posting_type_id", FieldType::Int32),
                FieldDef::optional("cost_centre_id", FieldType::Int32),
                FieldDef::optional("amount", FieldType::Float64),
                FieldDef::optional("currency_code", FieldType::Utf8),
                FieldDef::optional("description", FieldType::Utf8),
                FieldDef::optional("created_date", FieldType::Timestamp),
                FieldDef::optional("modified_date", FieldType::Timestamp),
            ],
        )
    }

    #[rustfmt::skip]
    fn seed_rows() -> Vec<Self> {
        vec![
            Self::booked(1,  date(2024, 1, 15), 1, 1, Some(1500.00),  "GBP", "Q1 accrual - Finance Ops"),
            Self::booked(2,  date(2024, 1, 20), 3, 2, Some(2300.50),  "GBP", "Manual adj - Sales EMEA"),
            Self::booked(3,  date(2024, 2, 1),  2, 1, Some(-1500.00), "GBP", "Reversal of entry 1"),
            Self::booked(4,  date(2024, 2, 10), 4, 4, Some(8750.00),  "GBP", "System entry - IT infra"),
            Self::booked(5,  date(2024, 2, 14), 1, 3, Some(3200.00),  "USD", "Q1 accrual - Sales APAC"),
            Self::booked(6,  date(2024, 3, 1),  3, 5, Some(450.75),   "GBP", "Manual adj - HR & People"),
            Self::booked(7,  date(2024, 3, 15), 1, 2, Some(5100.00),  "GBP", "Q1 accrual - Sales EMEA"),
            Self::booked(8,  date(2024, 3, 31), 4, 1, Some(1200.00),  "GBP", "System close - Finance Ops"),
            Self::booked(9,  date(2024, 4, 5),  3, 3, Some(2800.00),  "USD", "Manual adj - Sales APAC"),
            Self::booked(10, date(2024, 4, 10), 1, 4, Some(9500.00),  "GBP", "Q2 accrual - IT infra"),
            // Null amount: excluded downstream by `WHERE amount IS NOT NULL`.
            Self::booked(11, date(2024, 4, 20), 3, 2, None,           "GBP", "Incomplete entry - excluded"),
        ]
    }

    fn to_row(&self) -> Row {
        vec![
            self.journal_entry_id.into(),
            self.journal_date.into(),
            self.posting_type_id.into(),
            self.cost_centre_id.into(),
            self.amount.into(),
            self.currency_code.into(),
            self.description.into(),
            self.created_date.into(),
            self.modified_date.into(),
        ]
    }

    fn note(rows: &[Self]) -> Option<String> {
        let null_amounts = rows.iter().filter(|r| r.amount.is_none()).count();
        (null_amounts > 0).then(|| format!("{null_amounts} excluded by Silver filter"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Value, preview};

    #[test]
    fn test_exactly_entry_11_has_null_amount() {
        let null_ids: Vec<_> = JournalEntry::seed_rows()
            .iter()
            .filter(|r| r.amount.is_none())
            .map(|r| r.journal_entry_id)
            .collect();
        assert_eq!(null_ids, [11]);
    }

    #[test]
    fn test_null_amount_becomes_null_value() {
        let rows = JournalEntry::seed_rows();
        let row = rows.last().unwrap().to_row();
        assert_eq!(row[4], Value::Null);
        assert_eq!(rows[2].to_row()[4], Value::Float64(-1500.0));
    }

    #[test]
    fn test_stamps_match_journal_date() {
        for row in JournalEntry::seed_rows() {
            let stamp = row.created_date.unwrap();
            assert_eq!(stamp.date(), row.journal_date);
            assert_eq!(row.created_date, row.modified_date);
        }
    }

    #[test]
    fn test_note_counts_null_amounts() {
        assert_eq!(
            JournalEntry::note(&JournalEntry::seed_rows()),
            Some("1 excluded by Silver filter".to_string())
        );
    }

    #[test]
    fn test_preview_shows_null_amount_row() {
        let data = JournalEntry::table_data();
        let batch = data.definition.to_record_batch(&data.rows).unwrap();
        let text = preview(&batch).unwrap();

        let header = text.lines().nth(1).unwrap();
        assert!(header.contains("journal_entry_id") && header.contains("amount"), "{text}");

        let row = text
            .lines()
            .find(|line| line.contains("Incomplete entry - excluded"))
            .unwrap();
        let cells: Vec<_> = row.split('|').map(str::trim).collect();
        assert_eq!(cells[1], "11", "{row}");
        assert_eq!(cells[2], "2024-04-20", "{row}");
        assert_eq!(cells[5], "", "{row}");
        assert_eq!(cells[6], "GBP", "{row}");
    }
}
