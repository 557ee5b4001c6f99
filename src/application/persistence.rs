//! Structured values over [`KeyValueStorage`].
//!
//! Faults never reach the caller: a missing or unreadable entry loads as the
//! supplied default, and a failed write is logged and dropped. In-memory state
//! stays authoritative for the session either way, and the next successful
//! save overwrites whatever was corrupt.

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::storage::KeyValueStorage;

pub const TASKS_KEY: &str = "tasks";
pub const THEME_KEY: &str = "theme";

#[derive(Clone)]
pub struct Persistence<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> Persistence<S> {
    pub fn new(storage: S) -> Self { Self { storage } }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using default");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value unreadable, using default");
                default
            }
        }
    }

    /// Returns whether the value reached storage. Callers are free to ignore it.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not serialize value, not saved");
                return false;
            }
        };
        match self.storage.set_item(key, &text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage write failed, keeping in-memory state");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_storage::MemoryStorage;

    #[test]
    fn missing_entry_loads_default() {
        let persistence = Persistence::new(MemoryStorage::new());
        let value: Vec<u32> = persistence.load("nums", vec![7]);
        assert_eq!(value, vec![7]);
    }

    #[test]
    fn corrupt_entry_loads_default_and_next_save_heals_it() {
        let storage = MemoryStorage::new();
        storage.set_item("nums", "{not json").unwrap();
        let persistence = Persistence::new(storage.clone());
        assert_eq!(persistence.load::<Vec<u32>>("nums", Vec::new()), Vec::<u32>::new());

        assert!(persistence.save("nums", &[1, 2, 3]));
        assert_eq!(storage.get_item("nums").unwrap().as_deref(), Some("[1,2,3]"));
        assert_eq!(persistence.load::<Vec<u32>>("nums", Vec::new()), vec![1, 2, 3]);
    }

    #[test]
    fn wrong_shape_loads_default() {
        let storage = MemoryStorage::new();
        storage.set_item("nums", "\"a string\"").unwrap();
        let persistence = Persistence::new(storage);
        assert!(persistence.load::<Vec<u32>>("nums", Vec::new()).is_empty());
    }

    #[test]
    fn write_failure_is_absorbed() {
        let persistence = Persistence::new(MemoryStorage::with_quota(4));
        assert!(!persistence.save("nums", &[1, 2, 3]));
        assert!(persistence.load::<Vec<u32>>("nums", Vec::new()).is_empty());
    }
}
