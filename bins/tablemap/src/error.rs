#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("not a filter: '{0}'")]
    NotAFilter(String),

    #[error("store backend '{0}' is not available (expected 'memory')")]
    UnknownBackend(String),

    #[error("{0}")]
    Map(#[from] tablemap_api::MapError),

    #[error("{0}")]
    Store(#[from] tablemap_api::StoreError),

    #[error("{0}")]
    Repository(#[from] tablemap_repository::RepositoryError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
