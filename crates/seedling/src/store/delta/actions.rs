//! Data file encoding and Delta Lake Add actions.

use bytes::Bytes;
use deltalake::arrow::array::RecordBatch;
use deltalake::kernel::{Action, Add};
use deltalake::parquet::arrow::ArrowWriter;
use deltalake::parquet::basic::Compression;
use deltalake::parquet::file::properties::WriterProperties;
use deltalake::parquet::file::reader::{FileReader, SerializedFileReader};
use snafu::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ParquetSnafu, StatsEncodeSnafu, StoreError};

/// Name of a new data file inside a table directory.
pub fn data_file_name() -> String {
    format!("part-00000-{}-c000.snappy.parquet", uuid::Uuid::new_v4())
}

/// Encode `batch` as a single Snappy-compressed Parquet file.
pub fn encode_parquet(batch: &RecordBatch) -> Result<Bytes, StoreError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).context(ParquetSnafu)?;
    writer.write(batch).context(ParquetSnafu)?;
    writer.close().context(ParquetSnafu)?;

    Ok(Bytes::from(buffer))
}

/// Number of rows recorded in the footer of a Parquet file.
pub fn parquet_row_count(bytes: Bytes) -> Result<u64, StoreError> {
    let reader = SerializedFileReader::new(bytes).context(ParquetSnafu)?;
    row_count_from_footer(reader.metadata().file_metadata().num_rows())
}

fn row_count_from_footer(rows: i64) -> Result<u64, StoreError> {
    u64::try_from(rows).map_err(|_| StoreError::InvalidRowCount { rows })
}

/// Create an Add action for a data file written directly below the table root.
pub fn create_add_action(path: &str, size: usize, num_records: usize) -> Result<Action, StoreError> {
    let stats = serde_json::to_string(&serde_json::json!({ "numRecords": num_records }))
        .context(StatsEncodeSnafu)?;

    debug!(path, size, num_records, "Creating add action");

    Ok(Action::Add(Add {
        path: path.trim_start_matches('/').to_string(),
        size: size as i64,
        partition_values: HashMap::new(),
        modification_time: chrono::Utc::now().timestamp_millis(),
        data_change: true,
        stats: Some(stats),
        ..Default::default()
    }))
}
