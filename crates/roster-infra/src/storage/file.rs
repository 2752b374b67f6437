//! Key-value store persisted as a single JSON document on disk.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use roster_core::StoreError;
use roster_core::ports::KeyValueStore;

const FILE_NAME: &str = "store.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| now > exp).unwrap_or(false)
    }
}

/// Stores every key in `<dir>/store.json`.
///
/// The whole document is rewritten on each change; writes go to a
/// temporary file first and are renamed into place.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, Entry>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Store file is corrupt, starting empty");
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn save(&self, entries: &HashMap<String, Entry>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().await;
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read store");
                return None;
            }
        };

        let entry = entries.get(key)?;
        if !entry.is_expired(Utc::now()) {
            return Some(entry.value.clone());
        }

        entries.remove(key);
        if let Err(e) = self.save(&entries).await {
            tracing::warn!(error = %e, "Failed to drop expired entry");
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;

        let expires_at = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
            ),
            None => None,
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );

        self.save(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();

        let store = FileStore::new(dir.path());
        store.set("roster.auth_token", "tok-1", None).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get("roster.auth_token").await.as_deref(), Some("tok-1"));

        reopened.delete("roster.auth_token").await.unwrap();
        assert!(!FileStore::new(dir.path()).exists("roster.auth_token").await);
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("not-yet-created"));
        assert_eq!(store.get("anything").await, None);
        store.delete("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.set("k", "v", Some(Duration::ZERO)).await.unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.get("k").await, None);
        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(!raw.contains("\"k\""));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_tolerated() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join(FILE_NAME), b"{oops").await.unwrap();

        let store = FileStore::new(dir.path());
        assert_eq!(store.get("k").await, None);
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
    }
}
