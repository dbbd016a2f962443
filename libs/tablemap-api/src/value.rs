use std::fmt;

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MapError;

// ════════════════════════════════════════════════════════════════
//  Cell Kind
// ════════════════════════════════════════════════════════════════

/// Kind tag of a stored cell. The store recognises exactly these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Binary,
    Boolean,
    DateTime,
    Double,
    Guid,
    Int32,
    Int64,
    String,
}

impl CellKind {
    pub const ALL: [CellKind; 8] = [
        CellKind::Binary,
        CellKind::Boolean,
        CellKind::DateTime,
        CellKind::Double,
        CellKind::Guid,
        CellKind::Int32,
        CellKind::Int64,
        CellKind::String,
    ];

    /// Store-native type name (`Edm.*`), used in the wire form.
    pub fn edm_name(self) -> &'static str {
        match self {
            CellKind::Binary => "Edm.Binary",
            CellKind::Boolean => "Edm.Boolean",
            CellKind::DateTime => "Edm.DateTime",
            CellKind::Double => "Edm.Double",
            CellKind::Guid => "Edm.Guid",
            CellKind::Int32 => "Edm.Int32",
            CellKind::Int64 => "Edm.Int64",
            CellKind::String => "Edm.String",
        }
    }

    pub fn from_edm_name(name: &str) -> Option<Self> {
        CellKind::ALL.into_iter().find(|k| k.edm_name() == name)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.edm_name())
    }
}

// ════════════════════════════════════════════════════════════════
//  Value Cell
// ════════════════════════════════════════════════════════════════

/// A single typed storage unit within a row. Exactly one kind is active.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCell {
    Binary(Vec<u8>),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Double(f64),
    Guid(Uuid),
    Int32(i32),
    Int64(i64),
    String(String),
}

impl ValueCell {
    /// The empty String cell. Absent values are stored this way.
    pub fn empty() -> Self {
        ValueCell::String(String::new())
    }

    pub fn kind(&self) -> CellKind {
        match self {
            ValueCell::Binary(_) => CellKind::Binary,
            ValueCell::Boolean(_) => CellKind::Boolean,
            ValueCell::DateTime(_) => CellKind::DateTime,
            ValueCell::Double(_) => CellKind::Double,
            ValueCell::Guid(_) => CellKind::Guid,
            ValueCell::Int32(_) => CellKind::Int32,
            ValueCell::Int64(_) => CellKind::Int64,
            ValueCell::String(_) => CellKind::String,
        }
    }

    pub fn is_empty_string(&self) -> bool {
        matches!(self, ValueCell::String(s) if s.is_empty())
    }
}

/// String form of a cell. This is what becomes a row key.
impl fmt::Display for ValueCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCell::Binary(b) => {
                f.write_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
            ValueCell::Boolean(v) => write!(f, "{v}"),
            ValueCell::DateTime(v) => f.write_str(&format_datetime(v)),
            ValueCell::Double(v) => write!(f, "{v}"),
            ValueCell::Guid(v) => write!(f, "{}", v.hyphenated()),
            ValueCell::Int32(v) => write!(f, "{v}"),
            ValueCell::Int64(v) => write!(f, "{v}"),
            ValueCell::String(v) => f.write_str(v),
        }
    }
}

/// RFC 3339 with as many fractional digits as needed, `Z` suffix.
pub(crate) fn format_datetime(v: &DateTime<Utc>) -> String {
    v.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

// ════════════════════════════════════════════════════════════════
//  Wire form
// ════════════════════════════════════════════════════════════════

/// JSON shape of a cell: `{"type": "Edm.Int32", "value": 5}`.
///
/// Int64 values are written as JSON numbers but strings are accepted on read,
/// and non-finite doubles travel as strings (`"NaN"`, `"inf"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCell {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

impl From<&ValueCell> for WireCell {
    fn from(cell: &ValueCell) -> Self {
        use serde_json::Value;
        let value = match cell {
            ValueCell::Binary(b) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            ValueCell::Boolean(v) => Value::Bool(*v),
            ValueCell::DateTime(v) => Value::String(format_datetime(v)),
            ValueCell::Double(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            ValueCell::Guid(v) => Value::String(v.hyphenated().to_string()),
            ValueCell::Int32(v) => Value::from(*v),
            ValueCell::Int64(v) => Value::from(*v),
            ValueCell::String(v) => Value::String(v.clone()),
        };
        WireCell {
            kind: cell.kind().edm_name().to_string(),
            value,
        }
    }
}

impl ValueCell {
    /// Rebuild a cell from its wire form.
    ///
    /// An unknown `type` tag fails with `UnsupportedCellType`; a known tag with
    /// a value of the wrong shape fails with `Cell`.
    pub fn from_wire(column: &str, wire: &WireCell) -> Result<Self, MapError> {
        let kind = CellKind::from_edm_name(&wire.kind)
            .ok_or_else(|| MapError::unsupported(column, &wire.kind))?;
        let value = &wire.value;
        let mismatch = || MapError::cell(column, format!("malformed {kind} value: {value}"));

        let cell = match kind {
            CellKind::Binary => {
                let text = value.as_str().ok_or_else(mismatch)?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .map_err(|e| MapError::cell(column, e))?;
                ValueCell::Binary(bytes)
            }
            CellKind::Boolean => ValueCell::Boolean(value.as_bool().ok_or_else(mismatch)?),
            CellKind::DateTime => {
                let text = value.as_str().ok_or_else(mismatch)?;
                ValueCell::DateTime(parse_datetime(text).map_err(|e| MapError::cell(column, e))?)
            }
            CellKind::Double => match value {
                serde_json::Value::Number(n) => ValueCell::Double(n.as_f64().ok_or_else(mismatch)?),
                serde_json::Value::String(s) => {
                    ValueCell::Double(s.parse().map_err(|_| mismatch())?)
                }
                _ => return Err(mismatch()),
            },
            CellKind::Guid => {
                let text = value.as_str().ok_or_else(mismatch)?;
                ValueCell::Guid(Uuid::parse_str(text).map_err(|e| MapError::cell(column, e))?)
            }
            CellKind::Int32 => {
                let wide = value.as_i64().ok_or_else(mismatch)?;
                ValueCell::Int32(i32::try_from(wide).map_err(|e| MapError::cell(column, e))?)
            }
            CellKind::Int64 => match value {
                serde_json::Value::Number(n) => ValueCell::Int64(n.as_i64().ok_or_else(mismatch)?),
                serde_json::Value::String(s) => {
                    ValueCell::Int64(s.parse().map_err(|_| mismatch())?)
                }
                _ => return Err(mismatch()),
            },
            CellKind::String => ValueCell::String(value.as_str().ok_or_else(mismatch)?.to_string()),
        };
        Ok(cell)
    }
}

// ════════════════════════════════════════════════════════════════
//  Blob
// ════════════════════════════════════════════════════════════════

/// Byte payload stored natively as a Binary cell.
///
/// A plain `Vec<u8>` field is a collection and is therefore embedded as text;
/// wrap it in `Blob` to keep it in a Binary cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(v: Vec<u8>) -> Self {
        Blob(v)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Blob {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BlobVisitor;

        impl<'de> serde::de::Visitor<'de> for BlobVisitor {
            type Value = Blob;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("bytes, a byte sequence or a base64 string")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Blob, E> {
                Ok(Blob(v.to_vec()))
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Blob, E> {
                Ok(Blob(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Blob, E> {
                base64::engine::general_purpose::STANDARD
                    .decode(v)
                    .map(Blob)
                    .map_err(E::custom)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(self, mut seq: A) -> Result<Blob, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Ok(Blob(bytes))
            }
        }

        deserializer.deserialize_any(BlobVisitor)
    }
}
