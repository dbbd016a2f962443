//! Scalar field values ↔ cells, through serde.
//!
//! A Scalar field is serialized with [`CellSerializer`], which accepts only
//! primitive shapes, then coerced to the declared cell kind (UUIDs and
//! timestamps serialize as text). Reading goes the other way: the stored cell
//! kind is checked against the declared kind first, then the value is fed to
//! the field type's `Deserialize` impl through [`CellDeserializer`].

mod de;
mod ser;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::MapError;
use crate::schema::{FieldDescriptor, accepts};
use crate::value::{CellKind, ValueCell, parse_datetime};

pub use de::CellDeserializer;
pub use ser::CellSerializer;

/// Error raised inside the serde bridge. Converted to [`MapError::Cell`]
/// with the column name attached before it leaves this module.
#[derive(Debug)]
pub struct CellError(String);

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CellError {}

impl serde::ser::Error for CellError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CellError(msg.to_string())
    }
}

impl serde::de::Error for CellError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CellError(msg.to_string())
    }
}

/// Encode a Scalar field value as a cell of its declared kind.
pub fn to_cell<V: Serialize + ?Sized>(
    value: &V,
    descriptor: &FieldDescriptor,
) -> Result<ValueCell, MapError> {
    let column = descriptor.name();
    let cell = value
        .serialize(CellSerializer)
        .map_err(|e| MapError::cell(column, e))?;
    coerce(cell, descriptor.ty().cell_kind(), column)
}

/// Decode a Scalar field value from a stored cell.
///
/// The cell kind must be one the declared kind accepts; a nullable field also
/// accepts the empty String cell, which reads as `None`.
pub fn from_cell<V: DeserializeOwned>(
    cell: &ValueCell,
    descriptor: &FieldDescriptor,
) -> Result<V, MapError> {
    let column = descriptor.name();
    let declared = descriptor.ty().cell_kind();
    let accepted = match declared {
        _ if descriptor.ty().is_nullable() && cell.is_empty_string() => true,
        Some(declared) => accepts(declared, cell.kind()),
        None => false,
    };
    if !accepted {
        return Err(MapError::unsupported(column, cell.kind()));
    }
    V::deserialize(CellDeserializer::new(cell).strip_quotes(true))
        .map_err(|e| MapError::cell(column, e))
}

/// Bring a serialized cell to the declared kind.
///
/// The empty String cell (an absent value) is never converted.
fn coerce(
    cell: ValueCell,
    declared: Option<CellKind>,
    column: &str,
) -> Result<ValueCell, MapError> {
    let cell = match (declared, cell) {
        (_, cell) if cell.is_empty_string() => cell,
        (Some(CellKind::Guid), ValueCell::String(s)) => {
            ValueCell::Guid(Uuid::parse_str(&s).map_err(|e| MapError::cell(column, e))?)
        }
        (Some(CellKind::DateTime), ValueCell::String(s)) => {
            ValueCell::DateTime(parse_datetime(&s).map_err(|e| MapError::cell(column, e))?)
        }
        (Some(CellKind::Int64), ValueCell::Int32(v)) => ValueCell::Int64(i64::from(v)),
        (Some(CellKind::Double), ValueCell::Int32(v)) => ValueCell::Double(f64::from(v)),
        (_, cell) => cell,
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::schema::TypeDescriptor;
    use crate::value::Blob;

    fn field(kind: CellKind) -> FieldDescriptor {
        FieldDescriptor::new("f", TypeDescriptor::Primitive(kind))
    }

    fn nullable(kind: CellKind) -> FieldDescriptor {
        FieldDescriptor::new("f", TypeDescriptor::nullable(TypeDescriptor::Primitive(kind)))
    }

    #[test]
    fn primitives_land_in_matching_cells() {
        assert_eq!(to_cell(&true, &field(CellKind::Boolean)).unwrap(), ValueCell::Boolean(true));
        assert_eq!(to_cell(&7_u8, &field(CellKind::Int32)).unwrap(), ValueCell::Int32(7));
        assert_eq!(to_cell(&-7_i64, &field(CellKind::Int64)).unwrap(), ValueCell::Int64(-7));
        assert_eq!(to_cell(&7_u32, &field(CellKind::Int64)).unwrap(), ValueCell::Int64(7));
        assert_eq!(to_cell(&1.5_f32, &field(CellKind::Double)).unwrap(), ValueCell::Double(1.5));
        assert_eq!(
            to_cell(&Blob(vec![1, 2]), &field(CellKind::Binary)).unwrap(),
            ValueCell::Binary(vec![1, 2])
        );
    }

    #[test]
    fn uuid_and_timestamp_are_coerced_from_text() {
        let id = Uuid::new_v4();
        assert_eq!(to_cell(&id, &field(CellKind::Guid)).unwrap(), ValueCell::Guid(id));

        let at: DateTime<Utc> = Utc.with_ymd_and_hms(2023, 5, 17, 8, 30, 0).unwrap();
        assert_eq!(to_cell(&at, &field(CellKind::DateTime)).unwrap(), ValueCell::DateTime(at));
        let back: DateTime<Utc> =
            from_cell(&ValueCell::DateTime(at), &field(CellKind::DateTime)).unwrap();
        assert_eq!(back, at);
    }

    #[test]
    fn none_is_an_empty_string_cell() {
        let absent: Option<i32> = None;
        let cell = to_cell(&absent, &nullable(CellKind::Int32)).unwrap();
        assert_eq!(cell, ValueCell::empty());

        let back: Option<i32> = from_cell(&cell, &nullable(CellKind::Int32)).unwrap();
        assert_eq!(back, None);
    }

    #[test]
    fn non_primitive_value_is_rejected() {
        let err = to_cell(&vec![1, 2, 3], &field(CellKind::String)).unwrap_err();
        assert!(matches!(err, MapError::Cell { .. }));
    }

    #[test]
    fn u64_beyond_int64_is_rejected() {
        assert!(to_cell(&u64::MAX, &field(CellKind::Int64)).is_err());
    }

    #[test]
    fn string_reads_strip_double_quotes() {
        let text: String =
            from_cell(&ValueCell::String("\"Bob\"".into()), &field(CellKind::String)).unwrap();
        assert_eq!(text, "Bob");
    }

    #[test]
    fn mismatched_kind_is_unsupported() {
        let err =
            from_cell::<i32>(&ValueCell::Binary(vec![0]), &field(CellKind::Int32)).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnsupportedCellType { ref kind, .. } if kind == "Edm.Binary"
        ));

        let err = from_cell::<bool>(&ValueCell::String("true".into()), &field(CellKind::Boolean))
            .unwrap_err();
        assert!(matches!(err, MapError::UnsupportedCellType { .. }));
    }

    #[test]
    fn int32_cell_widens_into_int64_field() {
        let v: i64 = from_cell(&ValueCell::Int32(41), &field(CellKind::Int64)).unwrap();
        assert_eq!(v, 41);
    }

    #[test]
    fn guid_field_reads_text_cells() {
        let id = Uuid::new_v4();
        let v: Uuid =
            from_cell(&ValueCell::String(id.to_string()), &field(CellKind::Guid)).unwrap();
        assert_eq!(v, id);
    }
}
