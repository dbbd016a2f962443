use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::value::{ValueCell, WireCell};

// ════════════════════════════════════════════════════════════════
//  Columns
// ════════════════════════════════════════════════════════════════

/// Column name → cell map of a row, in insertion order.
///
/// Rows are narrow, so lookups scan linearly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    entries: Vec<(String, ValueCell)>,
}

impl Columns {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a column.
    pub fn set(&mut self, name: impl Into<String>, cell: ValueCell) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = cell;
        } else {
            self.entries.push((name, cell));
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&ValueCell> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueCell)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ValueCell)> for Columns {
    fn from_iter<I: IntoIterator<Item = (String, ValueCell)>>(iter: I) -> Self {
        let mut columns = Columns::new();
        for (name, cell) in iter {
            columns.set(name, cell);
        }
        columns
    }
}

// ════════════════════════════════════════════════════════════════
//  TableRow
// ════════════════════════════════════════════════════════════════

/// Generic row of the wide-column store.
///
/// `(partition_key, row_key)` address the row. `dirty` marks a row built by
/// the encoder that has not been written yet; rows read back from a store
/// are clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRow", into = "WireRow")]
pub struct TableRow {
    pub partition_key: String,
    pub row_key: String,
    pub timestamp: DateTime<Utc>,
    pub dirty: bool,
    pub columns: Columns,
}

impl TableRow {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            timestamp: Utc::now(),
            dirty: true,
            columns: Columns::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, cell: ValueCell) -> Self {
        self.columns.set(name, cell);
        self
    }
}

/// JSON shape of a row:
///
/// ```json
/// {"PartitionKey": "users", "RowKey": "42", "Timestamp": "2024-01-01T00:00:00Z",
///  "columns": [{"name": "Age", "type": "Edm.Int32", "value": 30}]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRow {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub columns: Vec<WireColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireColumn {
    pub name: String,
    #[serde(flatten)]
    pub cell: WireCell,
}

impl From<TableRow> for WireRow {
    fn from(row: TableRow) -> Self {
        let columns = row
            .columns
            .iter()
            .map(|(name, cell)| WireColumn {
                name: name.to_string(),
                cell: WireCell::from(cell),
            })
            .collect();
        WireRow {
            partition_key: row.partition_key,
            row_key: row.row_key,
            timestamp: row.timestamp,
            columns,
        }
    }
}

impl TryFrom<WireRow> for TableRow {
    type Error = MapError;

    fn try_from(wire: WireRow) -> Result<Self, MapError> {
        let columns = wire
            .columns
            .iter()
            .map(|c| Ok((c.name.clone(), ValueCell::from_wire(&c.name, &c.cell)?)))
            .collect::<Result<Columns, MapError>>()?;
        Ok(TableRow {
            partition_key: wire.partition_key,
            row_key: wire.row_key,
            timestamp: wire.timestamp,
            dirty: false,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut columns = Columns::new();
        columns.set("a", ValueCell::Int32(1));
        columns.set("b", ValueCell::Int32(2));
        columns.set("a", ValueCell::Int32(3));
        assert_eq!(columns.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(columns.get("a"), Some(&ValueCell::Int32(3)));
        assert_eq!(columns.get("A"), None);
    }

    #[test]
    fn json_rows_come_back_clean() {
        let row = TableRow::new("users", "42")
            .with_column("Age", ValueCell::Int32(30))
            .with_column("Name", ValueCell::String("Bob".into()));
        let json = serde_json::to_string(&row).unwrap();
        let back: TableRow = serde_json::from_str(&json).unwrap();
        assert!(!back.dirty);
        assert_eq!(back.columns, row.columns);
        assert_eq!(back.row_key, "42");
    }

    #[test]
    fn unknown_kind_fails_row_parsing() {
        let json = r#"{"PartitionKey":"p","RowKey":"r","Timestamp":"2024-01-01T00:00:00Z",
            "columns":[{"name":"Price","type":"Edm.Decimal","value":"1.50"}]}"#;
        let wire: WireRow = serde_json::from_str(json).unwrap();
        let err = TableRow::try_from(wire).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnsupportedCellType { ref column, .. } if column == "Price"
        ));
    }
}
