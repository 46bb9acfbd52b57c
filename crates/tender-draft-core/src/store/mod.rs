//! Persistence abstraction for Tender Draft.
//!
//! The [`KeyValueStore`] trait is the only storage surface the core and
//! application logic need: document collections and uploaded-file
//! metadata are each stored as one JSON value under a fixed key. Writes
//! are last-write-wins; no transactions are assumed.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Abstract key-value backend holding JSON values.
///
/// All operations are async (via `async-trait`) so that SQLite and
/// in-memory backends share one interface. In-memory implementations
/// return immediately-ready futures.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Load a typed value, or `T::default()` when the key is absent.
pub async fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("Failed to decode stored value for key '{}'", key)),
        None => Ok(T::default()),
    }
}

/// Serialize and store a typed value.
pub async fn save<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + Sync,
{
    let json = serde_json::to_value(value)
        .with_context(|| format!("Failed to encode value for key '{}'", key))?;
    store.set(key, json).await
}
