//! In-memory implementation of the label store.
//!
//! Primarily for tests and short-lived embeddings. Thread-safe via RwLock;
//! all data is lost when the store is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{ComponentVersionId, LabelStore};

/// In-memory label store.
pub struct MemoryLabelStore {
    inner: RwLock<HashMap<(ComponentVersionId, String), Value>>,
}

impl MemoryLabelStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored labels, across all component versions.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLabelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelStore for MemoryLabelStore {
    fn get_label(&self, version: &ComponentVersionId, name: &str) -> Result<Option<Value>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(inner.get(&(version.clone(), name.to_string())).cloned())
    }

    fn set_label(&self, version: &ComponentVersionId, name: &str, value: Value) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        debug!(%version, label = name, "storing label");
        inner.insert((version.clone(), name.to_string()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryLabelStore::new();
        let cv = ComponentVersionId::new("acme.org/widget", "1.0.0");

        assert!(store.get_label(&cv, "routing-slips").unwrap().is_none());

        store
            .set_label(&cv, "routing-slips", json!({"acme.org": []}))
            .unwrap();
        let value = store.get_label(&cv, "routing-slips").unwrap().unwrap();
        assert_eq!(value, json!({"acme.org": []}));
    }

    #[test]
    fn test_memory_store_replaces() {
        let store = MemoryLabelStore::new();
        let cv = ComponentVersionId::new("acme.org/widget", "1.0.0");

        store.set_label(&cv, "routing-slips", json!({"a": 1})).unwrap();
        store.set_label(&cv, "routing-slips", json!({"b": 2})).unwrap();
        let value = store.get_label(&cv, "routing-slips").unwrap().unwrap();
        assert_eq!(value, json!({"b": 2}));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_isolates_versions() {
        let store = MemoryLabelStore::new();
        let v1 = ComponentVersionId::new("acme.org/widget", "1.0.0");
        let v2 = ComponentVersionId::new("acme.org/widget", "2.0.0");

        store.set_label(&v1, "routing-slips", json!({"x": 1})).unwrap();
        assert!(store.get_label(&v2, "routing-slips").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_isolates_label_names() {
        let store = MemoryLabelStore::new();
        let cv = ComponentVersionId::new("acme.org/widget", "1.0.0");

        store.set_label(&cv, "routing-slips", json!({"x": 1})).unwrap();
        assert!(store.get_label(&cv, "other-label").unwrap().is_none());
    }
}
