use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Key-value store - the client's persisted local storage
/// (bearer token, form drafts).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value from the store.
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a value with optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Delete a key.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}
