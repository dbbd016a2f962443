use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::MapError;
use crate::query::StoreQuery;
use crate::row::TableRow;

// ════════════════════════════════════════════════════════════════
//  StoreError
// ════════════════════════════════════════════════════════════════

/// Category of a store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid store configuration: permanent.
    Config,
    /// Table or row does not exist.
    NotFound,
    /// Row already exists on insert.
    Conflict,
    /// Stored data could not be read back.
    Format,
    /// Anything else.
    Logic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::NotFound => f.write_str("not found"),
            ErrorKind::Conflict => f.write_str("conflict"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Logic => f.write_str("logic"),
        }
    }
}

/// Error returned by [`TableStore`] implementations.
///
/// Opaque to the mapping core: it is propagated, never interpreted.
#[derive(Clone)]
pub struct StoreError {
    kind: ErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Logic,
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Conflict,
            message: msg.into(),
        }
    }

    pub fn format_err(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Format,
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving its kind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::format_err(e.to_string())
    }
}

impl From<MapError> for StoreError {
    fn from(e: MapError) -> Self {
        Self::format_err(e.to_string())
    }
}

// ════════════════════════════════════════════════════════════════
//  Paging
// ════════════════════════════════════════════════════════════════

/// Opaque cursor for resuming a query. Only the store that issued it
/// interprets its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub rows: Vec<TableRow>,
    /// `None` when this was the last page.
    pub continuation: Option<ContinuationToken>,
}

// ════════════════════════════════════════════════════════════════
//  TableStore
// ════════════════════════════════════════════════════════════════

/// Client of the wide-column table store.
///
/// Implementations own transport, retries and paging; the mapping layer only
/// hands them rows and queries. Implementations must not hold on to the
/// borrowed arguments beyond the call (copy them before the `async` block).
pub trait TableStore: Send + Sync {
    /// Create `table` unless it exists. Returns `true` if it was created.
    fn create_table_if_not_exists(
        &self,
        table: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;

    /// Insert a new row. Fails with `Conflict` if the row exists.
    fn insert(
        &self,
        table: &str,
        row: TableRow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Insert the row, replacing an existing one with the same keys.
    fn insert_or_replace(
        &self,
        table: &str,
        row: TableRow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Delete a row. Fails with `NotFound` if it does not exist.
    fn delete(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Run a query, resuming at `continuation` if given.
    fn query(
        &self,
        table: &str,
        query: &StoreQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Pin<Box<dyn Future<Output = Result<QueryPage, StoreError>> + Send + '_>>;
}

/// Builds a [`TableStore`] from backend options.
///
/// `config_json` is the backend's option table serialized as JSON (`"{}"`
/// when none were given).
pub trait StoreFactory: Send + Sync {
    /// Backend name this factory serves, matched against `[store] backend`.
    fn backend(&self) -> &str;

    fn create(&self, config_json: &str) -> Result<Arc<dyn TableStore>, StoreError>;
}
