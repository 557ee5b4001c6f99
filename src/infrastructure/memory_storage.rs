use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::storage::{KeyValueStorage, StorageError};

/// Process-local storage. Clones share the same entries.
///
/// An optional byte quota (keys plus values, like the browser's per-origin
/// limit) makes writes fail with [`StorageError::QuotaExceeded`].
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(limit: usize) -> Self {
        Self { items: Arc::default(), quota: Some(limit) }
    }

    /// Total bytes currently held.
    pub fn used_bytes(&self) -> usize {
        self.lock().map(|items| items.iter().map(|(k, v)| k.len() + v.len()).sum()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items.lock().map_err(|_| StorageError::Unavailable("memory storage lock poisoned".into()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;
        if let Some(limit) = self.quota {
            let others: usize = items.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), needed, limit });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
