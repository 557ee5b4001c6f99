use super::persistence::{Persistence, THEME_KEY};
use crate::domain::storage::KeyValueStorage;
use crate::domain::theme::Theme;

pub struct ThemeStore<S: KeyValueStorage> {
    theme: Theme,
    persistence: Persistence<S>,
}

impl<S: KeyValueStorage> ThemeStore<S> {
    pub fn new(storage: S) -> Self {
        let persistence = Persistence::new(storage);
        let theme = persistence.load(THEME_KEY, Theme::default());
        Self { theme, persistence }
    }

    pub fn theme(&self) -> Theme { self.theme }

    /// Flips the preference, persists it and returns the new value for the
    /// presentation layer to apply.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.persistence.save(THEME_KEY, &self.theme);
        tracing::debug!(theme = %self.theme, "theme toggled");
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::KeyValueStorage;
    use crate::infrastructure::memory_storage::MemoryStorage;

    #[test]
    fn defaults_to_light() {
        let store = ThemeStore::new(MemoryStorage::new());
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn toggle_persists_as_json_string() {
        let storage = MemoryStorage::new();
        let mut store = ThemeStore::new(storage.clone());
        assert_eq!(store.toggle_theme(), Theme::Dark);
        assert_eq!(storage.get_item(THEME_KEY).unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(ThemeStore::new(storage).theme(), Theme::Dark);
    }

    #[test]
    fn unrecognized_stored_value_falls_back_to_light() {
        let storage = MemoryStorage::new();
        storage.set_item(THEME_KEY, "\"solarized\"").unwrap();
        assert_eq!(ThemeStore::new(storage).theme(), Theme::Light);
    }

    #[test]
    fn toggle_survives_storage_fault() {
        let mut store = ThemeStore::new(MemoryStorage::with_quota(0));
        assert_eq!(store.toggle_theme(), Theme::Dark);
        assert_eq!(store.theme(), Theme::Dark);
    }
}
