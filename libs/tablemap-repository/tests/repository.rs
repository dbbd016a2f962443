use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tablemap_api::{MapError, TableRecord, TableRow, TableStore, ValueCell};
use tablemap_repository::{RepositoryConfig, RepositoryError, TableRepository};
use tablemap_store_memory::{MemoryStoreFactory, MemoryTableStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Address {
    city: String,
}

#[derive(Debug, Clone, Default, PartialEq, TableRecord)]
struct User {
    #[table(rename = "Id")]
    id: String,
    #[table(rename = "Name")]
    name: String,
    #[table(rename = "Age")]
    age: i32,
    #[table(rename = "Address")]
    address: Option<Address>,
}

fn user(id: &str, name: &str, age: i32) -> User {
    User {
        id: id.into(),
        name: name.into(),
        age,
        address: Some(Address {
            city: "Oslo".into(),
        }),
    }
}

fn repository() -> (Arc<MemoryTableStore>, TableRepository<User>) {
    let store = Arc::new(MemoryTableStore::new(2));
    let repo = TableRepository::new(store.clone(), "users", "tenant-a");
    (store, repo)
}

#[tokio::test]
async fn insert_then_find() {
    let (_, repo) = repository();
    assert!(repo.ensure_table().await.unwrap());

    let key = repo.insert(&user("1", "Bob", 30)).await.unwrap();
    assert_eq!(key, "1");

    let found = repo.find("1").await.unwrap();
    assert_eq!(found, Some(user("1", "Bob", 30)));
    assert_eq!(repo.find("2").await.unwrap(), None);
}

#[tokio::test]
async fn insert_twice_is_a_conflict_update_is_not() {
    let (_, repo) = repository();
    repo.insert(&user("1", "Bob", 30)).await.unwrap();
    assert!(matches!(
        repo.insert(&user("1", "Bob", 31)).await,
        Err(RepositoryError::Store(_))
    ));

    repo.update(&user("1", "Bob", 31)).await.unwrap();
    assert_eq!(repo.find("1").await.unwrap().map(|u| u.age), Some(31));
}

#[tokio::test]
async fn record_without_id_gets_a_generated_key() {
    let (_, repo) = repository();
    let key = repo.insert(&user("", "Ann", 25)).await.unwrap();
    assert!(!key.is_empty());

    let found = repo.find(&key).await.unwrap().unwrap();
    assert_eq!(found.id, key);
    assert_eq!(found.name, "Ann");
}

#[tokio::test]
async fn get_uses_the_filter_within_the_partition() {
    let (store, repo) = repository();
    repo.insert(&user("1", "Bob", 30)).await.unwrap();
    repo.insert(&user("2", "Ann", 45)).await.unwrap();

    // Same name in another partition is invisible.
    let other: TableRepository<User> = TableRepository::new(store, "users", "tenant-b");
    other.insert(&user("3", "Cid", 60)).await.unwrap();

    assert_eq!(repo.get("Name eq Ann").await.unwrap().map(|u| u.id), Some("2".into()));
    assert_eq!(repo.get("Age > 40").await.unwrap().map(|u| u.id), Some("2".into()));
    assert_eq!(repo.get("Name=Bob").await.unwrap().map(|u| u.id), Some("1".into()));
    assert_eq!(repo.get("Name eq Cid").await.unwrap(), None);
}

#[tokio::test]
async fn get_rejects_bad_filters() {
    let (_, repo) = repository();
    assert!(matches!(
        repo.get("not a filter").await,
        Err(RepositoryError::UnparsableFilter(text)) if text == "not a filter"
    ));
    assert!(matches!(
        repo.get("Age == 3").await,
        Err(RepositoryError::Map(MapError::InvalidOperator(_)))
    ));
}

#[tokio::test]
async fn list_pages_through_the_partition() {
    let (_, repo) = repository();
    for (id, name) in [("a", "A"), ("b", "B"), ("c", "C")] {
        repo.insert(&user(id, name, 1)).await.unwrap();
    }

    let first = repo.list().await.unwrap();
    assert_eq!(first.len(), 2);

    let page = repo.list_page(None).await.unwrap();
    let token = page.continuation.expect("more rows");
    let rest = repo.list_page(Some(&token)).await.unwrap();
    assert_eq!(rest.records.len(), 1);
    assert_eq!(rest.records[0].id, "c");
    assert!(rest.continuation.is_none());
}

#[tokio::test]
async fn one_bad_row_fails_the_page() {
    let (store, repo) = repository();
    repo.insert(&user("1", "Bob", 30)).await.unwrap();
    store
        .insert(
            "users",
            TableRow::new("tenant-a", "2").with_column("Age", ValueCell::String("old".into())),
        )
        .await
        .unwrap();

    assert!(matches!(
        repo.list().await,
        Err(RepositoryError::Map(MapError::UnsupportedCellType { .. }))
    ));
}

#[tokio::test]
async fn delete_by_record_and_by_id() {
    let (_, repo) = repository();
    repo.insert(&user("1", "Bob", 30)).await.unwrap();
    repo.insert(&user("2", "Ann", 45)).await.unwrap();

    repo.delete(Some(&user("1", "Bob", 30))).await.unwrap();
    assert_eq!(repo.find("1").await.unwrap(), None);

    repo.delete_by_id("2").await.unwrap();
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_errors() {
    let (_, repo) = repository();
    assert!(matches!(
        repo.delete(None).await,
        Err(RepositoryError::ArgumentMissing("record"))
    ));
    assert!(matches!(
        repo.delete_by_id("nope").await,
        Err(RepositoryError::NotFound(id)) if id == "nope"
    ));
    assert!(matches!(
        repo.delete(Some(&user("9", "X", 1))).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn meta_lists_columns() {
    let (_, repo) = repository();
    assert_eq!(repo.meta(), vec!["Id", "Name", "Age", "Address"]);
}

#[tokio::test]
async fn open_from_config() {
    let config = RepositoryConfig::parse(
        r#"
        table = "users"
        partition_key = "tenant-a"

        [store]
        backend = "memory"
        page_size = 1
        "#,
    )
    .unwrap();
    let repo: TableRepository<User> = TableRepository::open(&config, &MemoryStoreFactory).unwrap();
    assert_eq!(repo.table(), "users");
    assert_eq!(repo.partition_key(), "tenant-a");

    repo.insert(&user("1", "Bob", 30)).await.unwrap();
    repo.insert(&user("2", "Ann", 45)).await.unwrap();
    let page = repo.list_page(None).await.unwrap();
    assert_eq!(page.records.len(), 1);
    assert!(page.continuation.is_some());
}

#[tokio::test]
async fn open_reports_bad_store_options() {
    let config = RepositoryConfig::parse(
        r#"
        table = "users"
        partition_key = "tenant-a"

        [store]
        page_size = 0
        "#,
    )
    .unwrap();
    let err = TableRepository::<User>::open(&config, &MemoryStoreFactory).err();
    assert!(matches!(err, Some(RepositoryError::Store(_))));
}

#[tokio::test]
async fn open_rejects_backend_the_factory_does_not_serve() {
    let config = RepositoryConfig::parse(
        r#"
        table = "users"
        partition_key = "tenant-a"

        [store]
        backend = "azure"
        "#,
    )
    .unwrap();
    let err = TableRepository::<User>::open(&config, &MemoryStoreFactory).err();
    assert!(matches!(err, Some(RepositoryError::Config(msg)) if msg.contains("azure")));
}
