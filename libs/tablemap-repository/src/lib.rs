//! Typed repository over a [`TableStore`]: one table, one partition, one
//! record type.

pub mod config;
pub mod error;

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use tablemap_api::{
    ContinuationToken, ErrorKind, StoreFactory, StoreQuery, TableRecord, TableRow, TableStore,
    decode, decode_all, encode, filter, list_field_names,
};

pub use config::{RepositoryConfig, StoreConfig};
pub use error::RepositoryError;

/// Records of one page plus the token for the next one.
#[derive(Debug, Clone)]
pub struct RecordPage<T> {
    pub records: Vec<T>,
    pub continuation: Option<ContinuationToken>,
}

/// Stores records of type `T` as rows of `table`, all under the same
/// partition key.
pub struct TableRepository<T> {
    store: Arc<dyn TableStore>,
    table: String,
    partition_key: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for TableRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table: self.table.clone(),
            partition_key: self.partition_key.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> TableRepository<T>
where
    T: TableRecord + Send,
{
    pub fn new(
        store: Arc<dyn TableStore>,
        table: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            partition_key: partition_key.into(),
            _record: PhantomData,
        }
    }

    /// Build the store with `factory` from the `[store]` options and bind the
    /// repository to the configured table and partition.
    ///
    /// Fails with `Config` when `[store] backend` names a backend other than
    /// the one `factory` serves.
    pub fn open(
        config: &RepositoryConfig,
        factory: &dyn StoreFactory,
    ) -> Result<Self, RepositoryError> {
        config.validate()?;
        if config.store.backend != factory.backend() {
            return Err(RepositoryError::Config(format!(
                "store backend '{}' is not served by the '{}' factory",
                config.store.backend,
                factory.backend()
            )));
        }
        let options = config.store.options_json()?;
        let store = factory
            .create(&options)
            .map_err(|e| RepositoryError::from(e).with_context(&config.store.backend))?;
        Ok(Self::new(store, &config.table, &config.partition_key))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Create the table unless it exists. Returns `true` if it was created.
    pub async fn ensure_table(&self) -> Result<bool, RepositoryError> {
        let created = self
            .store
            .create_table_if_not_exists(&self.table)
            .await
            .map_err(|e| RepositoryError::from(e).with_context(&self.table))?;
        debug!(table = %self.table, created, "ensure table");
        Ok(created)
    }

    /// Store a new record. Fails if a row with the same key exists.
    ///
    /// Returns the row key the record was stored under.
    pub async fn insert(&self, record: &T) -> Result<String, RepositoryError> {
        let row = encode(record, &self.partition_key)?;
        let row_key = row.row_key.clone();
        self.store
            .insert(&self.table, row)
            .await
            .map_err(|e| RepositoryError::from(e).with_context(format!("insert {row_key}")))?;
        debug!(table = %self.table, row_key = %row_key, "inserted");
        Ok(row_key)
    }

    /// Store a record, replacing the row with the same key if there is one.
    ///
    /// Returns the row key the record was stored under.
    pub async fn update(&self, record: &T) -> Result<String, RepositoryError> {
        let row = encode(record, &self.partition_key)?;
        let row_key = row.row_key.clone();
        self.store
            .insert_or_replace(&self.table, row)
            .await
            .map_err(|e| RepositoryError::from(e).with_context(format!("update {row_key}")))?;
        debug!(table = %self.table, row_key = %row_key, "updated");
        Ok(row_key)
    }

    /// Delete the row of `record`.
    ///
    /// The row key is derived the same way `insert` derives it, so a record
    /// without an identifier value never addresses a stored row.
    pub async fn delete(&self, record: Option<&T>) -> Result<(), RepositoryError> {
        let record = record.ok_or(RepositoryError::ArgumentMissing("record"))?;
        let row = encode(record, &self.partition_key)?;
        self.delete_row(&row.row_key).await
    }

    /// Delete the record with row key `id`.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError> {
        if self.find_row(id).await?.is_none() {
            warn!(table = %self.table, id, "delete of unknown record");
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        self.delete_row(id).await
    }

    /// The record with row key `id` in this partition.
    pub async fn find(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        match self.find_row(id).await? {
            Some(row) => Ok(Some(decode(&row)?)),
            None => Ok(None),
        }
    }

    /// First record of the partition matching `filter_text`.
    ///
    /// Fails with `UnparsableFilter` when the text is not a filter and with
    /// `Map(InvalidOperator)` when the operator is unknown.
    pub async fn get(&self, filter_text: &str) -> Result<Option<T>, RepositoryError> {
        let predicate = filter::parse(filter_text)?
            .ok_or_else(|| RepositoryError::UnparsableFilter(filter_text.to_string()))?;
        let query = StoreQuery::partition(&self.partition_key).with_predicate(predicate);
        debug!(table = %self.table, filter = %query, "get");

        // A page may come back empty while more rows remain.
        let mut continuation = None;
        loop {
            let page = self
                .store
                .query(&self.table, &query, continuation.as_ref())
                .await
                .map_err(|e| RepositoryError::from(e).with_context(&query))?;
            if let Some(row) = page.rows.first() {
                return Ok(Some(decode(row)?));
            }
            match page.continuation {
                Some(next) => continuation = Some(next),
                None => return Ok(None),
            }
        }
    }

    /// Records of the first page of the partition.
    pub async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.list_page(None).await?.records)
    }

    /// One page of the partition, resuming at `continuation`.
    ///
    /// Rows are decoded on the blocking pool. One undecodable row fails the
    /// whole page.
    pub async fn list_page(
        &self,
        continuation: Option<&ContinuationToken>,
    ) -> Result<RecordPage<T>, RepositoryError> {
        let query = StoreQuery::partition(&self.partition_key);
        let page = self
            .store
            .query(&self.table, &query, continuation)
            .await
            .map_err(|e| RepositoryError::from(e).with_context(&query))?;

        let rows = page.rows;
        let count = rows.len();
        let records = tokio::task::spawn_blocking(move || decode_all::<T>(&rows))
            .await
            .map_err(|e| RepositoryError::Worker(e.to_string()))??;

        debug!(table = %self.table, rows = count, more = page.continuation.is_some(), "list page");
        Ok(RecordPage {
            records,
            continuation: page.continuation,
        })
    }

    /// Column names of `T`.
    pub fn meta(&self) -> Vec<String> {
        list_field_names::<T>()
    }

    async fn find_row(&self, id: &str) -> Result<Option<TableRow>, RepositoryError> {
        let query = StoreQuery::row(&self.partition_key, id);
        let page = self
            .store
            .query(&self.table, &query, None)
            .await
            .map_err(|e| RepositoryError::from(e).with_context(&query))?;
        Ok(page.rows.into_iter().next())
    }

    async fn delete_row(&self, row_key: &str) -> Result<(), RepositoryError> {
        match self.store.delete(&self.table, &self.partition_key, row_key).await {
            Ok(()) => {
                debug!(table = %self.table, row_key, "deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(row_key.to_string()))
            }
            Err(e) => Err(RepositoryError::from(e).with_context(format!("delete {row_key}"))),
        }
    }
}
