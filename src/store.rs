//! In-memory task collection owned by the UI-facing layer.
//!
//! Entries are addressed by a `LocalKey` handed out on insert. The key stays
//! valid across removals of other entries and across id assignment, so a
//! placeholder row can be found again after its create call returns.

use crate::model::{Task, TaskId};

/// Stable handle to one entry of a `TaskStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalKey(u64);

impl std::fmt::Display for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct TaskStore {
    entries: Vec<(LocalKey, Task)>,
    next_key: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        for task in tasks {
            store.insert(task);
        }
        store
    }

    /// Drop every entry and load `tasks` in order. Previously issued keys
    /// no longer resolve.
    pub fn replace_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.entries.clear();
        for task in tasks {
            self.insert(task);
        }
    }

    /// Append a task and return its key.
    pub fn insert(&mut self, task: Task) -> LocalKey {
        let key = LocalKey(self.next_key);
        self.next_key += 1;
        self.entries.push((key, task));
        key
    }

    pub fn get(&self, key: LocalKey) -> Option<&Task> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, task)| task)
    }

    pub fn get_mut(&mut self, key: LocalKey) -> Option<&mut Task> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, task)| task)
    }

    /// Locate the entry carrying `id`.
    pub fn key_of(&self, id: &TaskId) -> Option<LocalKey> {
        self.entries
            .iter()
            .find(|(_, task)| task.has_id(id))
            .map(|(k, _)| *k)
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.key_of(id).and_then(|key| self.get(key))
    }

    pub fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.entries
            .iter_mut()
            .find(|(_, task)| task.has_id(id))
            .map(|(_, task)| task)
    }

    /// Write a server-assigned id onto the entry. Returns `false` when the
    /// entry has been dropped in the meantime.
    pub fn assign_id(&mut self, key: LocalKey, id: TaskId) -> bool {
        match self.get_mut(key) {
            Some(task) => {
                task.id = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.entries.iter().position(|(_, task)| task.has_id(id))?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter().map(|(_, task)| task)
    }

    /// Clone the current tasks in display order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: Option<i64>, title: &str) -> Task {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let mut t = Task::new(title, start, end);
        t.id = id.map(TaskId::Number);
        t
    }

    #[test]
    fn test_keys_survive_removal() {
        let mut store = TaskStore::from_tasks(vec![task(Some(1), "a"), task(Some(2), "b")]);
        let placeholder = store.insert(task(None, "new"));

        assert!(store.remove(&TaskId::Number(1)).is_some());
        assert!(store.assign_id(placeholder, TaskId::Number(30)));
        assert_eq!(store.find(&TaskId::Number(30)).unwrap().title, "new");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unassigned_tasks_never_match() {
        let store = TaskStore::from_tasks(vec![task(None, "draft")]);
        assert!(store.key_of(&TaskId::from("")).is_none());
    }

    #[test]
    fn test_replace_invalidates_keys() {
        let mut store = TaskStore::new();
        store.insert(task(Some(1), "a"));
        let last = store.insert(task(Some(2), "b"));
        assert_eq!(store.get(last).map(|t| t.title.as_str()), Some("b"));

        store.replace_all(vec![task(Some(9), "z")]);
        assert!(store.get(last).is_none());
        assert_eq!(store.snapshot()[0].title, "z");
        assert!(!store.assign_id(last, TaskId::Number(3)));
    }
}
