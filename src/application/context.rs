use super::task_store::TaskStore;
use super::theme_store::ThemeStore;
use crate::domain::storage::KeyValueStorage;

/// Both stores over one storage handle. Built once at startup and passed to
/// whatever drives the UI.
pub struct AppContext<S: KeyValueStorage> {
    pub tasks: TaskStore<S>,
    pub theme: ThemeStore<S>,
}

impl<S: KeyValueStorage> AppContext<S> {
    pub fn init(storage: S) -> Self {
        Self { tasks: TaskStore::new(storage.clone()), theme: ThemeStore::new(storage) }
    }
}
