use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("quota exceeded writing `{key}`: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { key: String, needed: usize, limit: usize },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

/// Text-in, text-out named storage, shaped like browser `localStorage`.
///
/// Handles are cheap to clone and share one underlying store, so several
/// owners (task and theme stores) can hold the same backend.
pub trait KeyValueStorage: Clone + Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
