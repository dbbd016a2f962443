use chrono::Utc;

use crate::error::MapError;
use crate::identifier::{IdSource, resolve_id};
use crate::row::{Columns, TableRow};
use crate::schema::{RecordSchema, TableRecord};

/// Encode a record into a fresh row of partition `partition_key`.
///
/// The record is not modified. Timestamp is the current time and the row is
/// marked dirty.
pub fn encode<T: TableRecord>(record: &T, partition_key: &str) -> Result<TableRow, MapError> {
    encode_with(T::schema(), record, partition_key)
}

pub fn encode_with<T>(
    schema: &RecordSchema<T>,
    record: &T,
    partition_key: &str,
) -> Result<TableRow, MapError> {
    let mut columns = Columns::with_capacity(schema.fields().len());
    for field in schema.fields() {
        columns.set(field.name(), field.read(record)?);
    }

    let resolved = resolve_id(columns.iter())?;
    if let IdSource::Filled(name) = &resolved.source {
        // Absent identifier: store the synthesized key in its column too.
        let cell = schema
            .field(name)
            .and_then(|f| f.descriptor().identifier_cell(&resolved.row_key));
        if let Some(cell) = cell {
            columns.set(name.as_str(), cell);
        }
    }

    Ok(TableRow {
        partition_key: partition_key.to_string(),
        row_key: resolved.row_key,
        timestamp: Utc::now(),
        dirty: true,
        columns,
    })
}

/// Decode a row into a new record.
///
/// Columns are matched to fields by exact name; fields without a column keep
/// the value the schema's factory gave them. Columns without a field are
/// ignored.
pub fn decode<T: TableRecord>(row: &TableRow) -> Result<T, MapError> {
    decode_with(T::schema(), row)
}

pub fn decode_with<T>(schema: &RecordSchema<T>, row: &TableRow) -> Result<T, MapError> {
    let mut record = schema.new_record();
    for field in schema.fields() {
        if let Some(cell) = row.columns.get(field.name()) {
            field.write(&mut record, cell)?;
        }
    }
    Ok(record)
}

/// Decode a batch. The first row that fails aborts the whole batch.
pub fn decode_all<T: TableRecord>(rows: &[TableRow]) -> Result<Vec<T>, MapError> {
    rows.iter().map(decode).collect()
}
