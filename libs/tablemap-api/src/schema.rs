use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::convert;
use crate::error::MapError;
use crate::value::{CellKind, ValueCell};

// ════════════════════════════════════════════════════════════════
//  Type Descriptor & classification
// ════════════════════════════════════════════════════════════════

/// Declared type of a record field, as far as the row layout cares.
///
/// Built from static type information: `#[derive(TableRecord)]` derives it
/// from the field's Rust type, manual schemas spell it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// Numeric, boolean, text and the other types a cell holds natively.
    Primitive(CellKind),
    /// `Option<T>`: absent values are stored as an empty String cell.
    Nullable(Box<TypeDescriptor>),
    /// Sequences, sets, maps, arrays, tuples.
    Collection(&'static str),
    /// Any other struct or enum.
    Record(&'static str),
}

impl TypeDescriptor {
    pub fn nullable(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Nullable(Box::new(inner))
    }

    /// Native cell kind, looking through `Nullable`.
    pub fn cell_kind(&self) -> Option<CellKind> {
        match self {
            TypeDescriptor::Primitive(kind) => Some(*kind),
            TypeDescriptor::Nullable(inner) => inner.cell_kind(),
            TypeDescriptor::Collection(_) | TypeDescriptor::Record(_) => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeDescriptor::Nullable(_))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{kind}"),
            TypeDescriptor::Nullable(inner) => write!(f, "nullable<{inner}>"),
            TypeDescriptor::Collection(name) => write!(f, "collection<{name}>"),
            TypeDescriptor::Record(name) => write!(f, "record<{name}>"),
        }
    }
}

/// Storage representation of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldClass {
    /// Stored natively as a typed cell.
    Scalar,
    /// Stored as self-describing JSON text in a String cell.
    Complex,
}

/// Collections and other non-primitive types are Complex, the rest Scalar.
pub fn classify(ty: &TypeDescriptor) -> FieldClass {
    match ty {
        TypeDescriptor::Primitive(_) => FieldClass::Scalar,
        TypeDescriptor::Nullable(inner) => classify(inner),
        TypeDescriptor::Collection(_) | TypeDescriptor::Record(_) => FieldClass::Complex,
    }
}

/// Which cell kinds a Scalar field of kind `declared` can be read from.
pub fn accepts(declared: CellKind, stored: CellKind) -> bool {
    use CellKind::*;
    match declared {
        Binary => stored == Binary,
        Boolean => stored == Boolean,
        DateTime => matches!(stored, DateTime | String),
        Double => matches!(stored, Double | Int32 | Int64),
        Guid => matches!(stored, Guid | String),
        Int32 => stored == Int32,
        Int64 => matches!(stored, Int32 | Int64),
        String => stored == String,
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Descriptor
// ════════════════════════════════════════════════════════════════

/// One field of a record type: column name, declared type, classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeDescriptor,
    class: FieldClass,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let class = classify(&ty);
        Self {
            name: name.into(),
            ty,
            class,
        }
    }

    /// Column name. Matching against stored columns is case-sensitive.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn class(&self) -> FieldClass {
        self.class
    }

    /// Cell holding a synthesized identifier, if this field can carry one.
    pub(crate) fn identifier_cell(&self, id: &str) -> Option<ValueCell> {
        if self.class != FieldClass::Scalar {
            return None;
        }
        match self.ty.cell_kind()? {
            CellKind::String => Some(ValueCell::String(id.to_string())),
            CellKind::Guid => uuid::Uuid::parse_str(id).ok().map(ValueCell::Guid),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Record Schema
// ════════════════════════════════════════════════════════════════

type ReadFn<T> = Box<dyn Fn(&T) -> Result<ValueCell, MapError> + Send + Sync>;
type WriteFn<T> = Box<dyn Fn(&mut T, &ValueCell) -> Result<(), MapError> + Send + Sync>;

/// A descriptor plus the accessors that move a field value to and from a cell.
pub struct FieldAccess<T> {
    descriptor: FieldDescriptor,
    read: ReadFn<T>,
    write: WriteFn<T>,
}

impl<T> FieldAccess<T> {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Current field value as a cell.
    pub fn read(&self, record: &T) -> Result<ValueCell, MapError> {
        (self.read)(record)
    }

    /// Assign the field from a stored cell.
    pub fn write(&self, record: &mut T, cell: &ValueCell) -> Result<(), MapError> {
        (self.write)(record, cell)
    }
}

/// Field descriptor table of one record type, plus the factory that creates
/// blank instances for decoding.
///
/// Built once per type (see [`TableRecord::schema`]) and only read afterwards,
/// so it is shared freely between threads.
pub struct RecordSchema<T> {
    type_name: &'static str,
    factory: fn() -> T,
    fields: Vec<FieldAccess<T>>,
}

impl<T: 'static> RecordSchema<T> {
    pub fn builder(type_name: &'static str, factory: fn() -> T) -> RecordSchemaBuilder<T> {
        RecordSchemaBuilder {
            type_name,
            factory,
            fields: Vec::new(),
        }
    }
}

impl<T> RecordSchema<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldAccess<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldAccess<T>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(FieldAccess::descriptor)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.descriptors().map(|d| d.name().to_string()).collect()
    }

    pub fn new_record(&self) -> T {
        (self.factory)()
    }
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.descriptors().collect::<Vec<_>>())
            .finish()
    }
}

pub struct RecordSchemaBuilder<T> {
    type_name: &'static str,
    factory: fn() -> T,
    fields: Vec<FieldAccess<T>>,
}

impl<T: 'static> RecordSchemaBuilder<T> {
    /// Register a field. Its classification follows from `ty`.
    ///
    /// ```ignore
    /// RecordSchema::builder("User", User::default)
    ///     .field::<String>("name", TypeDescriptor::Primitive(CellKind::String),
    ///         |u| &u.name, |u, v| u.name = v)
    ///     .build()
    /// ```
    pub fn field<V>(
        mut self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        let descriptor = FieldDescriptor::new(name, ty);

        let read: ReadFn<T> = {
            let descriptor = descriptor.clone();
            Box::new(move |record: &T| {
                let value = get(record);
                match descriptor.class() {
                    FieldClass::Scalar => convert::to_cell(value, &descriptor),
                    FieldClass::Complex => serde_json::to_string(value)
                        .map(ValueCell::String)
                        .map_err(|e| MapError::from(e).with_column(descriptor.name())),
                }
            })
        };

        let write: WriteFn<T> = {
            let descriptor = descriptor.clone();
            Box::new(move |record: &mut T, cell: &ValueCell| {
                let value: V = match descriptor.class() {
                    FieldClass::Scalar => convert::from_cell(cell, &descriptor)?,
                    FieldClass::Complex => match cell {
                        ValueCell::String(text) => {
                            // Empty text is an absent nullable value.
                            let text = if text.is_empty() && descriptor.ty().is_nullable() {
                                "null"
                            } else {
                                text.as_str()
                            };
                            serde_json::from_str(text)
                                .map_err(|e| MapError::from(e).with_column(descriptor.name()))?
                        }
                        other => {
                            return Err(MapError::unsupported(descriptor.name(), other.kind()));
                        }
                    },
                };
                set(record, value);
                Ok(())
            })
        };

        self.fields.push(FieldAccess {
            descriptor,
            read,
            write,
        });
        self
    }

    pub fn build(self) -> RecordSchema<T> {
        RecordSchema {
            type_name: self.type_name,
            factory: self.factory,
            fields: self.fields,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  TableRecord
// ════════════════════════════════════════════════════════════════

/// An application record type that maps to table rows.
///
/// Usually derived: `#[derive(TableRecord)]` builds the schema on first use
/// and caches it in a `OnceLock`.
pub trait TableRecord: Sized + 'static {
    fn schema() -> &'static RecordSchema<Self>;
}

/// Field (column) names of `T` in declaration order.
pub fn list_field_names<T: TableRecord>() -> Vec<String> {
    T::schema().field_names()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_scalar() {
        for kind in CellKind::ALL {
            assert_eq!(classify(&TypeDescriptor::Primitive(kind)), FieldClass::Scalar);
        }
    }

    #[test]
    fn collections_and_records_are_complex() {
        assert_eq!(classify(&TypeDescriptor::Collection("Vec")), FieldClass::Complex);
        assert_eq!(classify(&TypeDescriptor::Record("Address")), FieldClass::Complex);
    }

    #[test]
    fn nullable_follows_inner_type() {
        let opt_int = TypeDescriptor::nullable(TypeDescriptor::Primitive(CellKind::Int32));
        let opt_vec = TypeDescriptor::nullable(TypeDescriptor::Collection("Vec"));
        assert_eq!(classify(&opt_int), FieldClass::Scalar);
        assert_eq!(classify(&opt_vec), FieldClass::Complex);
        assert_eq!(opt_int.cell_kind(), Some(CellKind::Int32));
    }

    #[test]
    fn widening_reads_only() {
        assert!(accepts(CellKind::Int64, CellKind::Int32));
        assert!(!accepts(CellKind::Int32, CellKind::Int64));
        assert!(accepts(CellKind::Double, CellKind::Int64));
        assert!(!accepts(CellKind::Boolean, CellKind::String));
        assert!(!accepts(CellKind::String, CellKind::Binary));
    }

    #[derive(Default)]
    struct Manual {
        key: String,
        score: f64,
        labels: Vec<String>,
    }

    fn manual_schema() -> RecordSchema<Manual> {
        RecordSchema::builder("Manual", Manual::default)
            .field::<String>(
                "Key",
                TypeDescriptor::Primitive(CellKind::String),
                |m| &m.key,
                |m, v| m.key = v,
            )
            .field::<f64>(
                "Score",
                TypeDescriptor::Primitive(CellKind::Double),
                |m| &m.score,
                |m, v| m.score = v,
            )
            .field::<Vec<String>>(
                "Labels",
                TypeDescriptor::Collection("Vec"),
                |m| &m.labels,
                |m, v| m.labels = v,
            )
            .build()
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let schema = manual_schema();
        assert_eq!(schema.field_names(), vec!["Key", "Score", "Labels"]);
        assert_eq!(
            schema.field("Labels").map(|f| f.descriptor().class()),
            Some(FieldClass::Complex)
        );
    }

    #[test]
    fn accessors_move_values_through_cells() {
        let schema = manual_schema();
        let source = Manual {
            key: "k-1".into(),
            score: 2.5,
            labels: vec!["a".into(), "b".into()],
        };

        let labels = schema.field("Labels").unwrap();
        let cell = labels.read(&source).unwrap();
        assert_eq!(cell, ValueCell::String(r#"["a","b"]"#.into()));

        let mut target = schema.new_record();
        labels.write(&mut target, &cell).unwrap();
        schema
            .field("Score")
            .unwrap()
            .write(&mut target, &ValueCell::Double(2.5))
            .unwrap();
        assert_eq!(target.labels, source.labels);
        assert_eq!(target.score, 2.5);
        assert!(target.key.is_empty());
    }

    #[test]
    fn complex_field_rejects_non_string_cells() {
        let schema = manual_schema();
        let mut target = schema.new_record();
        let err = schema
            .field("Labels")
            .unwrap()
            .write(&mut target, &ValueCell::Int32(3))
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::UnsupportedCellType { ref column, ref kind }
                if column == "Labels" && kind == "Edm.Int32"
        ));
    }
}
