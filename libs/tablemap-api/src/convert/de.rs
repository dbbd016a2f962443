use serde::de::{self, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use super::CellError;
use crate::value::{ValueCell, format_datetime};

/// Feeds a stored cell to a field type's `Deserialize` impl.
///
/// Dispatch is on the cell's kind tag only. Guid and DateTime cells are
/// presented as their canonical text, which is what `uuid` and `chrono`
/// expect from a human-readable format.
pub struct CellDeserializer<'a> {
    cell: &'a ValueCell,
    strip_quotes: bool,
}

impl<'a> CellDeserializer<'a> {
    pub fn new(cell: &'a ValueCell) -> Self {
        Self {
            cell,
            strip_quotes: false,
        }
    }

    /// Remove embedded `"` from String cells before handing them out.
    ///
    /// Undoes the JSON quoting older writers applied to plain text columns.
    /// Lossy for text that really contains double quotes.
    pub fn strip_quotes(mut self, strip: bool) -> Self {
        self.strip_quotes = strip;
        self
    }

    fn text(&self, s: &'a str) -> std::borrow::Cow<'a, str> {
        if self.strip_quotes && s.contains('"') {
            std::borrow::Cow::Owned(s.replace('"', ""))
        } else {
            std::borrow::Cow::Borrowed(s)
        }
    }
}

impl<'de, 'a> de::Deserializer<'de> for CellDeserializer<'a> {
    type Error = CellError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CellError> {
        match self.cell {
            ValueCell::Binary(b) => visitor.visit_bytes(b),
            ValueCell::Boolean(v) => visitor.visit_bool(*v),
            ValueCell::DateTime(v) => visitor.visit_string(format_datetime(v)),
            ValueCell::Double(v) => visitor.visit_f64(*v),
            ValueCell::Guid(v) => visitor.visit_string(v.hyphenated().to_string()),
            ValueCell::Int32(v) => visitor.visit_i32(*v),
            ValueCell::Int64(v) => visitor.visit_i64(*v),
            ValueCell::String(s) => match self.text(s) {
                std::borrow::Cow::Borrowed(s) => visitor.visit_str(s),
                std::borrow::Cow::Owned(s) => visitor.visit_string(s),
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CellError> {
        if self.cell.is_empty_string() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CellError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CellError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CellError> {
        match self.cell {
            ValueCell::String(s) => {
                let variant: String = self.text(s).into_owned();
                visitor.visit_enum(variant.into_deserializer())
            }
            other => Err(<CellError as de::Error>::custom(format!(
                "expected a {name} variant name, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}
