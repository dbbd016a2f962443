mod predicate;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use tablemap_api::{
    ContinuationToken, QueryPage, StoreError, StoreFactory, StoreQuery, TableRow, TableStore,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_page_size() -> usize {
    1000
}

#[derive(Debug, serde::Deserialize)]
pub struct MemoryStoreConfig {
    /// Rows per query page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryTableStore
// ═══════════════════════════════════════════════════════════════

/// Rows of one table ordered by (partition key, row key).
type Table = BTreeMap<(String, String), TableRow>;

/// In-memory table store. Nothing survives the process unless a
/// [`snapshot`](MemoryTableStore::snapshot) is kept.
///
/// Tables are created on first write. Query pages come back in row key order;
/// the continuation token carries the row key the next page starts at.
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Table>>,
    page_size: usize,
}

impl MemoryTableStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(config: &MemoryStoreConfig) -> Result<Self, StoreError> {
        if config.page_size == 0 {
            return Err(StoreError::config("page_size must be greater than 0"));
        }
        Ok(Self::new(config.page_size))
    }

    /// All tables as JSON: `{"table": [row, ...]}`, rows in wire form.
    pub async fn snapshot(&self) -> Result<String, StoreError> {
        let tables = self.tables.read().await;
        let dump: BTreeMap<&str, Vec<&TableRow>> = tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.values().collect()))
            .collect();
        Ok(serde_json::to_string_pretty(&dump)?)
    }

    /// Replace every table with the content of a [`snapshot`](Self::snapshot).
    pub async fn restore(&self, json: &str) -> Result<(), StoreError> {
        let dump: BTreeMap<String, Vec<TableRow>> = serde_json::from_str(json)?;
        let restored: HashMap<String, Table> = dump
            .into_iter()
            .map(|(name, rows)| {
                let table = rows
                    .into_iter()
                    .map(|row| ((row.partition_key.clone(), row.row_key.clone()), row))
                    .collect();
                (name, table)
            })
            .collect();
        *self.tables.write().await = restored;
        Ok(())
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new(default_page_size())
    }
}

/// Row as the store keeps it: stamped now, no longer pending.
fn stored(mut row: TableRow) -> TableRow {
    row.timestamp = Utc::now();
    row.dirty = false;
    row
}

fn encode_token(row_key: &str) -> ContinuationToken {
    ContinuationToken::new(URL_SAFE_NO_PAD.encode(row_key))
}

fn decode_token(token: &ContinuationToken) -> Result<String, StoreError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.as_str())
        .map_err(|e| StoreError::new(format!("invalid continuation token: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::new(format!("invalid continuation token: {e}")))
}

impl TableStore for MemoryTableStore {
    fn create_table_if_not_exists(
        &self,
        table: &str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        let table = table.to_string();
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            if tables.contains_key(&table) {
                return Ok(false);
            }
            debug!(table = %table, "table created");
            tables.insert(table, Table::new());
            Ok(true)
        })
    }

    fn insert(
        &self,
        table: &str,
        row: TableRow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let table = table.to_string();
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(table.clone()).or_default();
            let key = (row.partition_key.clone(), row.row_key.clone());
            if rows.contains_key(&key) {
                return Err(StoreError::conflict(format!(
                    "row ({}, {}) already exists in '{table}'",
                    key.0, key.1
                )));
            }
            debug!(table = %table, partition_key = %key.0, row_key = %key.1, "row inserted");
            rows.insert(key, stored(row));
            Ok(())
        })
    }

    fn insert_or_replace(
        &self,
        table: &str,
        row: TableRow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let table = table.to_string();
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(table.clone()).or_default();
            let key = (row.partition_key.clone(), row.row_key.clone());
            debug!(table = %table, partition_key = %key.0, row_key = %key.1, "row upserted");
            rows.insert(key, stored(row));
            Ok(())
        })
    }

    fn delete(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let table = table.to_string();
        let key = (partition_key.to_string(), row_key.to_string());
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let rows = tables
                .get_mut(&table)
                .ok_or_else(|| StoreError::not_found(format!("table '{table}' does not exist")))?;
            if rows.remove(&key).is_none() {
                return Err(StoreError::not_found(format!(
                    "row ({}, {}) not found in '{table}'",
                    key.0, key.1
                )));
            }
            debug!(table = %table, partition_key = %key.0, row_key = %key.1, "row deleted");
            Ok(())
        })
    }

    fn query(
        &self,
        table: &str,
        query: &StoreQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Pin<Box<dyn Future<Output = Result<QueryPage, StoreError>> + Send + '_>> {
        let table = table.to_string();
        let query = query.clone();
        let continuation = continuation.cloned();
        Box::pin(async move {
            let start = match &continuation {
                Some(token) => decode_token(token)?,
                None => String::new(),
            };

            let tables = self.tables.read().await;
            let Some(rows) = tables.get(&table) else {
                return Ok(QueryPage::default());
            };

            let mut matched: Vec<TableRow> = rows
                .range((query.partition_key.clone(), start)..)
                .map(|(_, row)| row)
                .take_while(|row| row.partition_key == query.partition_key)
                .filter(|row| match &query.predicate {
                    Some(p) => predicate::matches(row, p),
                    None => true,
                })
                .take(self.page_size + 1)
                .cloned()
                .collect();

            let continuation = if matched.len() > self.page_size {
                matched.pop().map(|next| encode_token(&next.row_key))
            } else {
                None
            };

            debug!(
                table = %table,
                filter = %query,
                rows = matched.len(),
                more = continuation.is_some(),
                "query"
            );
            Ok(QueryPage {
                rows: matched,
                continuation,
            })
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreFactory
// ═══════════════════════════════════════════════════════════════

pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn backend(&self) -> &str {
        "memory"
    }

    fn create(&self, config_json: &str) -> Result<Arc<dyn TableStore>, StoreError> {
        let config: MemoryStoreConfig = if config_json == "{}" {
            MemoryStoreConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| StoreError::config(e.to_string()).with_context("memory store"))?
        };
        Ok(Arc::new(MemoryTableStore::from_config(&config)?))
    }
}

#[cfg(test)]
mod tests {
    use tablemap_api::{ErrorKind, FilterPredicate, Operator, ValueCell};

    use super::*;

    fn user(row_key: &str, age: i32) -> TableRow {
        TableRow::new("users", row_key).with_column("Age", ValueCell::Int32(age))
    }

    #[tokio::test]
    async fn create_table_reports_whether_it_was_new() {
        let store = MemoryTableStore::default();
        assert!(store.create_table_if_not_exists("t").await.unwrap());
        assert!(!store.create_table_if_not_exists("t").await.unwrap());
    }

    #[tokio::test]
    async fn insert_conflicts_but_upsert_replaces() {
        let store = MemoryTableStore::default();
        store.insert("t", user("1", 20)).await.unwrap();

        let err = store.insert("t", user("1", 21)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        store.insert_or_replace("t", user("1", 22)).await.unwrap();
        let page = store.query("t", &StoreQuery::row("users", "1"), None).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].columns.get("Age"), Some(&ValueCell::Int32(22)));
        assert!(!page.rows[0].dirty);
    }

    #[tokio::test]
    async fn delete_missing_row_is_not_found() {
        let store = MemoryTableStore::default();
        let err = store.delete("t", "users", "1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        store.insert("t", user("1", 20)).await.unwrap();
        store.delete("t", "users", "1").await.unwrap();
        let err = store.delete("t", "users", "1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn query_is_scoped_to_the_partition() {
        let store = MemoryTableStore::default();
        store.insert("t", user("1", 20)).await.unwrap();
        store
            .insert("t", TableRow::new("admins", "1").with_column("Age", ValueCell::Int32(50)))
            .await
            .unwrap();

        let page = store.query("t", &StoreQuery::partition("users"), None).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].partition_key, "users");
    }

    #[tokio::test]
    async fn query_applies_the_predicate() {
        let store = MemoryTableStore::default();
        for (rk, age) in [("1", 20), ("2", 35), ("3", 40)] {
            store.insert("t", user(rk, age)).await.unwrap();
        }
        let query = StoreQuery::partition("users")
            .with_predicate(FilterPredicate::new("Age", Operator::GreaterThanOrEqual, "35"));
        let page = store.query("t", &query, None).await.unwrap();
        let keys: Vec<_> = page.rows.iter().map(|r| r.row_key.as_str()).collect();
        assert_eq!(keys, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn pages_follow_continuation_tokens() {
        let store = MemoryTableStore::new(2);
        for rk in ["a", "b", "c", "d", "e"] {
            store.insert("t", user(rk, 1)).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut token = None;
        loop {
            let page = store
                .query("t", &StoreQuery::partition("users"), token.as_ref())
                .await
                .unwrap();
            assert!(page.rows.len() <= 2);
            seen.extend(page.rows.into_iter().map(|r| r.row_key));
            match page.continuation {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let store = MemoryTableStore::default();
        store.insert("t", user("1", 1)).await.unwrap();
        let token = ContinuationToken::new("%%%");
        assert!(store.query("t", &StoreQuery::partition("users"), Some(&token)).await.is_err());
    }

    #[tokio::test]
    async fn query_on_missing_table_is_empty() {
        let store = MemoryTableStore::default();
        let page = store.query("nope", &StoreQuery::partition("p"), None).await.unwrap();
        assert!(page.rows.is_empty());
        assert!(page.continuation.is_none());
    }

    #[tokio::test]
    async fn snapshot_restores_into_a_new_store() {
        let store = MemoryTableStore::default();
        store.insert("t", user("1", 20)).await.unwrap();
        store.insert("t", user("2", 30)).await.unwrap();
        let json = store.snapshot().await.unwrap();

        let copy = MemoryTableStore::default();
        copy.restore(&json).await.unwrap();
        let page = copy.query("t", &StoreQuery::partition("users"), None).await.unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[1].columns.get("Age"), Some(&ValueCell::Int32(30)));
    }

    #[test]
    fn factory_reads_options() {
        assert_eq!(MemoryStoreFactory.backend(), "memory");
        assert!(MemoryStoreFactory.create("{}").is_ok());
        assert!(MemoryStoreFactory.create(r#"{"page_size": 10}"#).is_ok());

        let err = MemoryStoreFactory.create(r#"{"page_size": 0}"#).err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Config));
        let err = MemoryStoreFactory.create("[1]").err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::Config));
    }
}
