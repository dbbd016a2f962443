use std::sync::Arc;

use tablemap_api::StoreFactory;
use tablemap_repository::{RepositoryConfig, StoreConfig, TableRepository};
use tablemap_store_memory::{MemoryStoreConfig, MemoryStoreFactory, MemoryTableStore};

use crate::config::DemoArgs;
use crate::error::CliError;
use crate::sample::{Contact, contacts};

fn default_config() -> RepositoryConfig {
    RepositoryConfig {
        table: "contacts".into(),
        partition_key: "demo".into(),
        store: StoreConfig::default(),
    }
}

pub async fn run(args: DemoArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => {
            let config = RepositoryConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => default_config(),
    };
    if config.store.backend != MemoryStoreFactory.backend() {
        return Err(CliError::UnknownBackend(config.store.backend.clone()));
    }

    let store_config: MemoryStoreConfig = serde_json::from_str(&config.store.options_json()?)?;
    let store = Arc::new(MemoryTableStore::from_config(&store_config)?);
    let repo: TableRepository<Contact> =
        TableRepository::new(store.clone(), &config.table, &config.partition_key);
    tracing::info!(
        table = %repo.table(),
        partition_key = %repo.partition_key(),
        "repository ready"
    );

    repo.ensure_table().await?;
    let mut keys = Vec::new();
    for contact in contacts() {
        keys.push(repo.insert(&contact).await?);
    }
    println!("inserted: {}", keys.join(", "));

    let listed = repo.list().await?;
    println!("list ({}):", listed.len());
    println!("{}", serde_json::to_string_pretty(&listed)?);

    let filter = "Age >= 40";
    match repo.get(filter).await? {
        Some(contact) => println!("get '{filter}': {} {}", contact.first_name, contact.last_name),
        None => println!("get '{filter}': no match"),
    }

    if let Some(first) = keys.first() {
        let found = repo.find(first).await?;
        println!("find '{first}': {}", serde_json::to_string(&found)?);

        repo.delete_by_id(first).await?;
        println!("deleted '{first}', {} left", repo.list().await?.len());
    }

    if args.dump {
        println!("{}", store.snapshot().await?);
    }
    Ok(())
}
