//! Field schemas and rows for seed tables.
//!
//! A [`TableDefinition`] is the ordered field list of a table with per-field
//! nullability. Rows are plain value vectors in field order; they are checked
//! against the definition before being turned into an Arrow record batch.

use std::fmt;
use std::sync::Arc;

use arrow::util::pretty::pretty_format_batches;
use chrono::{NaiveDate, NaiveDateTime};
use deltalake::arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int32Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use deltalake::arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef, TimeUnit};
use deltalake::arrow::error::ArrowError;

use crate::error::SeedError;

/// Timezone attached to timestamp columns.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Logical type of a seed table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int32,
    Utf8,
    Boolean,
    Float64,
    Date,
    Timestamp,
}

impl FieldType {
    /// Arrow type used when writing the field.
    pub fn arrow_type(&self) -> DataType {
        match self {
            FieldType::Int32 => DataType::Int32,
            FieldType::Utf8 => DataType::Utf8,
            FieldType::Boolean => DataType::Boolean,
            FieldType::Float64 => DataType::Float64,
            FieldType::Date => DataType::Date32,
            FieldType::Timestamp => {
                DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into()))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int32 => "integer",
            FieldType::Utf8 => "string",
            FieldType::Boolean => "boolean",
            FieldType::Float64 => "double",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field of a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: true,
        }
    }
}

/// A cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int32(i32),
    Utf8(String),
    Boolean(bool),
    Float64(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// The field type this value belongs to, `None` for null.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Int32(_) => Some(FieldType::Int32),
            Value::Utf8(_) => Some(FieldType::Utf8),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Float64(_) => Some(FieldType::Float64),
            Value::Date(_) => Some(FieldType::Date),
            Value::Timestamp(_) => Some(FieldType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One record, values in field order.
pub type Row = Vec<Value>;

/// Ordered field list of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: &'static str,
    pub fields: Vec<FieldDef>,
}

impl TableDefinition {
    pub fn new(name: &'static str, fields: Vec<FieldDef>) -> Self {
        Self { name, fields }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Check every row against the field list.
    ///
    /// A row must have one value per field, no null in a required field and
    /// no value of a different type than its field.
    pub fn validate(&self, rows: &[Row]) -> Result<(), SeedError> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != self.fields.len() {
                return Err(self.violation(format!(
                    "row {index} has {} values, expected {}",
                    row.len(),
                    self.fields.len()
                )));
            }

            for (field, value) in self.fields.iter().zip(row) {
                match value.field_type() {
                    None if !field.nullable => {
                        return Err(self.violation(format!(
                            "row {index} omits required field '{}'",
                            field.name
                        )));
                    }
                    Some(actual) if actual != field.field_type => {
                        return Err(self.violation(format!(
                            "row {index} field '{}': expected {}, got {actual}",
                            field.name, field.field_type
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn violation(&self, reason: String) -> SeedError {
        SeedError::SchemaViolation {
            table: self.name.to_string(),
            reason,
        }
    }

    /// Arrow schema matching this definition.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .fields
            .iter()
            .map(|f| Field::new(f.name, f.field_type.arrow_type(), f.nullable))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Validate `rows` and build a single record batch from them.
    ///
    /// An empty row set yields an empty batch that still carries the schema.
    pub fn to_record_batch(&self, rows: &[Row]) -> Result<RecordBatch, SeedError> {
        self.validate(rows)?;

        let schema = self.arrow_schema();
        if rows.is_empty() {
            return Ok(RecordBatch::new_empty(schema));
        }

        let columns: Vec<ArrayRef> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| build_column(field.field_type, rows.iter().map(|row| &row[i])))
            .collect();

        RecordBatch::try_new(schema, columns).map_err(|e| self.violation(e.to_string()))
    }
}

/// Render `batch` as a bordered text table with a header row. Nulls are
/// blank cells.
pub fn preview(batch: &RecordBatch) -> Result<String, ArrowError> {
    pretty_format_batches(std::slice::from_ref(batch)).map(|table| table.to_string())
}

/// Build one Arrow column. Values are already validated, so any value not of
/// `field_type` is a null.
fn build_column<'a>(field_type: FieldType, values: impl Iterator<Item = &'a Value>) -> ArrayRef {
    match field_type {
        FieldType::Int32 => Arc::new(Int32Array::from_iter(values.map(|v| match v {
            Value::Int32(x) => Some(*x),
            _ => None,
        }))),
        FieldType::Utf8 => Arc::new(StringArray::from_iter(values.map(|v| match v {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }))),
        FieldType::Boolean => Arc::new(BooleanArray::from_iter(values.map(|v| match v {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }))),
        FieldType::Float64 => Arc::new(Float64Array::from_iter(values.map(|v| match v {
            Value::Float64(x) => Some(*x),
            _ => None,
        }))),
        FieldType::Date => Arc::new(Date32Array::from_iter(values.map(|v| match v {
            Value::Date(d) => Some(Date32Type::from_naive_date(*d)),
            _ => None,
        }))),
        FieldType::Timestamp => Arc::new(
            TimestampMicrosecondArray::from_iter(values.map(|v| match v {
                Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                _ => None,
            }))
            .with_timezone(TIMESTAMP_TZ),
        ),
    }
}
