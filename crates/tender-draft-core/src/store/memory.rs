//! In-memory [`KeyValueStore`] implementation, used by tests.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::KeyValueStore;

/// In-memory key-value store.
pub struct InMemoryKvStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let values = self.values.read().unwrap();
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut values = self.values.write().unwrap();
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SavedDocument;
    use crate::store::{load_or_default, save};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = InMemoryKvStore::new();
        assert!(store.get("nothing").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = InMemoryKvStore::new();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!({"v": 2})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"v": 2})));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = InMemoryKvStore::new();
        let empty: Vec<SavedDocument> = load_or_default(&store, "savedETPs").await.unwrap();
        assert!(empty.is_empty());

        let docs = vec![SavedDocument::draft(7, "ETP", Default::default())];
        save(&store, "savedETPs", &docs).await.unwrap();
        let loaded: Vec<SavedDocument> = load_or_default(&store, "savedETPs").await.unwrap();
        assert_eq!(loaded, docs);
    }

    #[tokio::test]
    async fn test_decode_error_names_key() {
        let store = InMemoryKvStore::new();
        store.set("savedTRs", json!("not a list")).await.unwrap();
        let err = load_or_default::<Vec<SavedDocument>>(&store, "savedTRs")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("savedTRs"));
    }
}
