use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory slice of the keyspace held by this node. All access goes
/// through one mutex; critical sections stay short and never block on I/O.
#[derive(Debug, Default)]
pub struct LocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl LocalStore {
    pub fn new() -> Self {
        LocalStore::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: String) {
        self.entries.lock().unwrap().insert(key, value);
    }

    /// Removes a key, reporting whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let store = LocalStore::new();
        store.insert("user:1".to_string(), "Alice".to_string());
        assert_eq!(store.get("user:1").as_deref(), Some("Alice"));
        assert_eq!(store.get("user:2"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_overwrites() {
        let store = LocalStore::new();
        store.insert("k".to_string(), "v1".to_string());
        store.insert("k".to_string(), "v2".to_string());
        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let store = LocalStore::new();
        store.insert("k".to_string(), "v".to_string());
        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(store.is_empty());
    }
}
