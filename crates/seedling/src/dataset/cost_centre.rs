//! `cost_centre`: organisational cost centre dimension.

use chrono::NaiveDateTime;

use super::{SeedTable, midnight};
use crate::schema::{FieldDef, FieldType, Row, TableDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct CostCentre {
    pub cost_centre_id: i32,
    pub cost_centre_code: &'static str,
    pub cost_centre_name: Option<&'static str>,
    pub department: Option<&'static str>,
    pub is_active: bool,
    pub created_date: Option<NaiveDateTime>,
    pub modified_date: Option<NaiveDateTime>,
}

impl CostCentre {
    fn active(id: i32, code: &'static str, name: &'static str, department: &'static str) -> Self {
        let jan_1 = midnight(2024, 1, 1);
        Self {
            cost_centre_id: id,
            cost_centre_code: code,
            cost_centre_name: Some(name),
            department: Some(department),
            is_active: true,
            created_date: Some(jan_1),
            modified_date: Some(jan_1),
        }
    }
}

impl SeedTable for CostCentre {
    const TABLE_NAME: &'static str = "cost_centre";

    fn definition() -> TableDefinition {
        TableDefinition::new(
            Self::TABLE_NAME,
            vec![
                FieldDef::required("cost_centre_id", FieldType::Int32),
                FieldDef::required("cost_centre_code", FieldType::Utf8),
                FieldDef::optional("cost_centre_name", FieldType::Utf8),
                FieldDef::optional("department", FieldType::Utf8),
                FieldDef::required("is_active", FieldType::Boolean),
                FieldDef::optional("created_date", FieldType::Timestamp),
                FieldDef::optional("modified_date", FieldType::Timestamp),
            ],
        )
    }

    fn seed_rows() -> Vec<Self> {
        vec![
            Self::active(1, "CC001", "Finance Operations", "Finance"),
            Self::active(2, "CC002", "Sales EMEA", "Sales"),
            Self::active(3, "CC003", "Sales APAC", "Sales"),
            Self::active(4, "CC004", "IT Infrastructure", "Technology"),
            Self::active(5, "CC005", "HR & People", "HR"),
            // Decommissioned: dropped by the downstream cost_centre view.
            Self {
                cost_centre_id: 6,
                cost_centre_code: "CC006",
                cost_centre_name: Some("Decommissioned Dept"),
                department: Some("Legacy"),
                is_active: false,
                created_date: Some(midnight(2023, 1, 1)),
                modified_date: Some(midnight(2024, 3, 1)),
            },
        ]
    }

    fn to_row(&self) -> Row {
        vec![
            self.cost_centre_id.into(),
            self.cost_centre_code.into(),
            self.cost_centre_name.into(),
            self.department.into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;

    #[test]
    fn test_codes_follow_ids() {
        for row in CostCentre::seed_rows() {
            assert_eq!(
                row.cost_centre_code,
                format!("CC{:03}", row.cost_centre_id)
            );
        }
    }

    #[test]
    fn test_only_cc006_inactive() {
        let rows = CostCentre::seed_rows();
        let inactive: Vec<_> = rows.iter().filter(|r| !r.is_active).collect();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].cost_centre_id, 6);
        assert_eq!(inactive[0].cost_centre_code, "CC006");
        assert_eq!(inactive[0].created_date, Some(midnight(2023, 1, 1)));
    }

    #[test]
    fn test_row_values_in_field_order() {
        let row = CostCentre::seed_rows()[4].to_row();
        let definition = CostCentre::definition();
        assert_eq!(row.len(), definition.fields.len());
        assert_eq!(row[2], Value::from("HR & People"));
        assert_eq!(row[3], Value::from("HR"));
    }
}
