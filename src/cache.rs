//! Per-engine store of rendered `<ssr-cache>` spans

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Name -> final HTML of the last successful render of that span
///
/// Shared by concurrent renders; the last writer for a name wins.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, String>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn insert(&self, name: impl Into<String>, html: impl Into<String>) {
        self.write().insert(name.into(), html.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.write().remove(name)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer cannot leave a half-written String behind, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites() {
        let store = CacheStore::new();
        store.insert("nav", "<nav>1</nav>");
        store.insert("nav", "<nav>2</nav>");
        assert_eq!(store.get("nav").as_deref(), Some("<nav>2</nav>"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_and_remove() {
        let store = CacheStore::new();
        store.insert("a", "x");
        store.insert("b", "y");
        assert_eq!(store.remove("a").as_deref(), Some("x"));
        assert!(!store.contains("a"));
        store.clear();
        assert!(store.is_empty());
    }
}
