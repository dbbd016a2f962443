use tablemap_api::{MapError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A required argument was not supplied.
    #[error("missing argument: {0}")]
    ArgumentMissing(&'static str),

    #[error("record not found: {0}")]
    NotFound(String),

    /// The filter text has neither accepted shape.
    #[error("not a filter: '{0}'")]
    UnparsableFilter(String),

    #[error("mapping error: {0}")]
    Map(#[from] MapError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),

    /// Background decode task panicked or was cancelled.
    #[error("worker error: {0}")]
    Worker(String),
}

impl RepositoryError {
    /// Add context to the error.
    ///
    /// For `Store` variant, context is added to the inner `StoreError`.
    /// For `Config` and `Worker`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            RepositoryError::Store(e) => RepositoryError::Store(e.with_context(ctx)),
            RepositoryError::Config(msg) => RepositoryError::Config(format!("{ctx}: {msg}")),
            RepositoryError::Worker(msg) => RepositoryError::Worker(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
