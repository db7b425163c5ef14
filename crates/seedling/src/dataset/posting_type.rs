//! `posting_type`: lookup of journal posting categories.

use chrono::NaiveDateTime;

use super::{SeedTable, midnight};
use crate::schema::{FieldDef, FieldType, Row, TableDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct PostingType {
    pub posting_type_id: i32,
    pub posting_type_code: &'static str,
    pub posting_type_description: Option<&'static str>,
    pub is_active: bool,
    pub created_date: Option<NaiveDateTime>,
    pub modified_date: Option<NaiveDateTime>,
}

impl PostingType {
    fn new(
        id: i32,
        code: &'static str,
        description: &'static str,
        is_active: bool,
        created: NaiveDateTime,
        modified: NaiveDateTime,
    ) -> Self {
        Self {
            posting_type_id: id,
            posting_type_code: code,
            posting_type_description: Some(description),
            is_active,
            created_date: Some(created),
            modified_date: Some(modified),
        }
    }
}

impl SeedTable for PostingType {
    const TABLE_NAME: &'static str = "posting_type";

    fn definition() -> TableDefinition {
        TableDefinition::new(
            Self::TABLE_NAME,
            vec![
                FieldDef::required("posting_type_id", FieldType::Int32),
                FieldDef::required("posting_type_code", FieldType::Utf8),
                FieldDef::optional("posting_type_description", FieldType::Utf8),
                FieldDef::required("is_active", FieldType::Boolean),
                FieldDef::optional("created_date", FieldType::Timestamp),
                FieldDef::optional("modified_date", FieldType::Timestamp),
            ],
        )
    }

    fn seed_rows() -> Vec<Self> {
        let jan_1 = midnight(2024, 1, 1);
        vec![
            Self::new(1, "ACCRUAL", "Accrual posting", true, jan_1, jan_1),
            Self::new(2, "REVERSAL", "Reversal of prior entry", true, jan_1, jan_1),
            Self::new(3, "MANUAL", "Manual journal entry", true, jan_1, jan_1),
            Self::new(4, "SYSTEM", "System-generated entry", true, jan_1, jan_1),
            // Inactive: dropped by the downstream posting_type view.
            Self::new(5, "LEGACY", "Legacy system entry", false, jan_1, midnight(2024, 6, 1)),
        ]
    }

    fn to_row(&self) -> Row {
        vec![
            self.posting_type_id.into(),
            self.posting_type_code.into(),
            self.posting_type_description.into(),
            self.is_active.into(),
            self.created_date.into(),
            self.modified_date.into(),
        ]
    }

    fn note(rows: &[Self]) -> Option<String> {
        let inactive = rows.iter().filter(|r| !r.is_active).count();
        (inactive > 0).then(|| format!("{inactive} inactive"))
    }
}
