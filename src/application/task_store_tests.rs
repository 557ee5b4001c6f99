#[cfg(test)]
mod tests {
    use super::super::persistence::TASKS_KEY;
    use super::super::task_store::{TaskError, TaskStore};
    use crate::domain::{storage::{KeyValueStorage, StorageError}, task::{TaskColor, TaskId, TaskPatch, TaskStats}};
    use crate::infrastructure::memory_storage::MemoryStorage;
    use std::collections::HashSet;

    /// Storage whose writes always fail, counting attempts.
    #[derive(Clone, Default)]
    struct BrokenStorage {
        writes: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl KeyValueStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> { Err(StorageError::Unavailable("disabled".into())) }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(StorageError::Unavailable("disabled".into()))
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageError> { Ok(()) }
    }

    fn store_with(titles: &[&str]) -> (TaskStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let mut store = TaskStore::new(storage.clone());
        for t in titles { store.add_task(t, None, None).unwrap(); }
        (store, storage)
    }

    fn texts(store: &TaskStore<MemoryStorage>) -> Vec<&str> {
        store.all_tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn add_trims_and_defaults() {
        let (mut store, _) = store_with(&[]);
        let task = store.add_task("  Buy milk  ", Some("  2 litres "), None).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.description, "2 litres");
        assert_eq!(task.color, TaskColor::Blue);
        assert!(!task.completed);
        assert!(task.updated_at.is_none());
        assert_eq!(store.all_tasks().len(), 1);
    }

    #[test]
    fn add_rejects_blank_titles_without_touching_storage() {
        let (mut store, storage) = store_with(&[]);
        assert_eq!(store.add_task("", None, None), Err(TaskError::EmptyTitle));
        assert_eq!(store.add_task("   ", Some("desc"), None), Err(TaskError::EmptyTitle));
        assert!(store.all_tasks().is_empty());
        assert_eq!(storage.get_item(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn add_appends_to_end_with_unique_ids() {
        let (mut store, _) = store_with(&["a", "b"]);
        store.add_task("a", None, Some(TaskColor::Pink)).unwrap();
        assert_eq!(texts(&store), ["a", "b", "a"]);
        let ids: HashSet<&TaskId> = store.all_tasks().iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn toggle_twice_restores_state_and_order() {
        let (mut store, _) = store_with(&["a", "b", "c"]);
        let id = store.all_tasks()[1].id.clone();
        assert!(store.toggle_task(&id));
        assert!(store.get_task(&id).unwrap().completed);
        assert!(store.get_task(&id).unwrap().updated_at.is_none());
        assert!(store.toggle_task(&id));
        assert!(!store.get_task(&id).unwrap().completed);
        assert_eq!(texts(&store), ["a", "b", "c"]);
    }

    #[test]
    fn missing_id_operations_are_silent_no_ops() {
        let (mut store, storage) = store_with(&["a", "b"]);
        let before = store.all_tasks().to_vec();
        let stored = storage.get_item(TASKS_KEY).unwrap();
        let ghost = TaskId::from("does-not-exist");

        assert!(!store.toggle_task(&ghost));
        assert!(!store.delete_task(&ghost));
        assert_eq!(store.update_task(&ghost, TaskPatch { text: Some("x".into()), ..Default::default() }), Ok(false));

        assert_eq!(store.all_tasks(), before.as_slice());
        assert_eq!(storage.get_item(TASKS_KEY).unwrap(), stored);
    }

    #[test]
    fn delete_removes_only_the_match() {
        let (mut store, _) = store_with(&["a", "b", "c"]);
        let id = store.all_tasks()[1].id.clone();
        assert!(store.delete_task(&id));
        assert_eq!(texts(&store), ["a", "c"]);
        assert!(store.get_task(&id).is_none());
        assert!(!store.delete_task(&id));
    }

    #[test]
    fn update_patches_given_fields_and_stamps() {
        let (mut store, _) = store_with(&["a"]);
        let id = store.all_tasks()[0].id.clone();
        let patch = TaskPatch { description: Some("  details ".into()), color: Some(TaskColor::Green), ..Default::default() };
        assert_eq!(store.update_task(&id, patch), Ok(true));
        let task = store.get_task(&id).unwrap();
        assert_eq!(task.text, "a");
        assert_eq!(task.description, "details");
        assert_eq!(task.color, TaskColor::Green);
        assert!(!task.completed);
        assert!(task.updated_at.is_some());
        assert!(task.updated_at.unwrap() >= task.created_at);
    }

    #[test]
    fn update_can_set_completion() {
        let (mut store, _) = store_with(&["a"]);
        let id = store.all_tasks()[0].id.clone();
        store.update_task(&id, TaskPatch { completed: Some(true), ..Default::default() }).unwrap();
        assert_eq!(store.task_stats(), TaskStats { total: 1, completed: 1, pending: 0 });
    }

    #[test]
    fn update_rejects_blank_title() {
        let (mut store, _) = store_with(&["keep me"]);
        let id = store.all_tasks()[0].id.clone();
        let patch = TaskPatch { text: Some("   ".into()), color: Some(TaskColor::Red), ..Default::default() };
        assert_eq!(store.update_task(&id, patch), Err(TaskError::EmptyTitle));
        let task = store.get_task(&id).unwrap();
        assert_eq!(task.text, "keep me");
        assert_eq!(task.color, TaskColor::Blue);
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let (mut store, _) = store_with(&["a"]);
        let id = store.all_tasks()[0].id.clone();
        assert_eq!(store.update_task(&id, TaskPatch::default()), Ok(true));
        assert!(store.get_task(&id).unwrap().updated_at.is_none());
    }

    #[test]
    fn reorder_moves_single_element() {
        let (mut store, _) = store_with(&["A", "B", "C"]);
        assert!(store.reorder_tasks(0, 2));
        assert_eq!(texts(&store), ["B", "C", "A"]);

        let (mut store, _) = store_with(&["A", "B", "C"]);
        assert!(store.reorder_tasks(2, 0));
        assert_eq!(texts(&store), ["C", "A", "B"]);
    }

    #[test]
    fn reorder_rejects_out_of_range_and_same_slot() {
        let (mut store, _) = store_with(&["A", "B", "C"]);
        assert!(!store.reorder_tasks(3, 0));
        assert!(!store.reorder_tasks(0, 3));
        assert!(!store.reorder_tasks(1, 1));
        assert_eq!(texts(&store), ["A", "B", "C"]);
    }

    #[test]
    fn filters_partition_the_collection() {
        let (mut store, _) = store_with(&["a", "b", "c", "d", "e"]);
        for i in [0, 3, 4] {
            let id = store.all_tasks()[i].id.clone();
            store.toggle_task(&id);
        }
        let completed: Vec<&str> = store.completed_tasks().iter().map(|t| t.text.as_str()).collect();
        let pending: Vec<&str> = store.pending_tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(completed, ["a", "d", "e"]);
        assert_eq!(pending, ["b", "c"]);

        let stats = store.task_stats();
        assert_eq!(stats, TaskStats { total: 5, completed: 3, pending: 2 });
        assert_eq!(stats.total, stats.completed + stats.pending);
    }

    #[test]
    fn every_mutation_rewrites_whole_collection() {
        let (mut store, storage) = store_with(&["a", "b"]);
        let id = store.all_tasks()[0].id.clone();
        store.toggle_task(&id);
        store.reorder_tasks(0, 1);

        let raw = storage.get_item(TASKS_KEY).unwrap().unwrap();
        let stored: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["text"], "b");
        assert_eq!(stored[1]["text"], "a");
        assert_eq!(stored[1]["completed"], true);
        assert_eq!(stored[1]["color"], "#4a90e2");
    }

    #[test]
    fn reload_reproduces_ids_order_and_fields() {
        let (mut store, storage) = store_with(&["one", "two", "three"]);
        let id = store.all_tasks()[2].id.clone();
        store.update_task(&id, TaskPatch { color: Some(TaskColor::Cyan), ..Default::default() }).unwrap();

        let reloaded = TaskStore::new(storage);
        assert_eq!(reloaded.all_tasks(), store.all_tasks());
    }

    #[test]
    fn corrupt_storage_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(TASKS_KEY, "[{\"id\": broken").unwrap();
        let mut store = TaskStore::new(storage.clone());
        assert!(store.all_tasks().is_empty());
        store.add_task("fresh start", None, None).unwrap();
        assert_eq!(TaskStore::new(storage).all_tasks().len(), 1);
    }

    #[test]
    fn duplicate_stored_ids_keep_first() {
        let storage = MemoryStorage::new();
        let raw = r#"[
            {"id":"1","text":"first","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"1","text":"second","createdAt":"2024-01-01T00:00:00Z"},
            {"id":"2","text":"third","createdAt":"2024-01-01T00:00:00Z"}
        ]"#;
        storage.set_item(TASKS_KEY, raw).unwrap();
        let store = TaskStore::new(storage);
        assert_eq!(texts(&store), ["first", "third"]);
    }

    #[test]
    fn store_keeps_working_when_storage_is_broken() {
        let storage = BrokenStorage::default();
        let mut store = TaskStore::new(storage.clone());
        let task = store.add_task("still here", None, None).unwrap();
        assert!(store.toggle_task(&task.id));
        assert_eq!(store.task_stats(), TaskStats { total: 1, completed: 1, pending: 0 });
        assert_eq!(storage.writes.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
