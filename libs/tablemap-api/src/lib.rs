//! Mapping between typed records and the rows of a wide-column table store.
//!
//! - [`schema`]: field descriptors, classification, `TableRecord`
//! - [`mapping`]: record → row and row → record
//! - [`filter`]: the textual filter grammar
//! - [`store`]: the store client boundary

extern crate self as tablemap_api;

pub mod convert;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod mapping;
pub mod query;
pub mod row;
pub mod schema;
pub mod store;
pub mod value;

pub use tablemap_api_derive::TableRecord;

pub use error::MapError;
pub use filter::{FilterPredicate, Operator};
pub use mapping::{decode, decode_all, encode};
pub use query::StoreQuery;
pub use row::{Columns, TableRow};
pub use schema::{
    FieldClass, FieldDescriptor, RecordSchema, TableRecord, TypeDescriptor, classify,
    list_field_names,
};
pub use store::{ContinuationToken, ErrorKind, QueryPage, StoreError, StoreFactory, TableStore};
pub use value::{Blob, CellKind, ValueCell};

/// Re-exports used by `#[derive(TableRecord)]` expansions.
#[doc(hidden)]
pub mod __private {
    pub use std::sync::OnceLock;
}
