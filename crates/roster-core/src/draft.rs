//! Auto-saved draft of the person entry form.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FormValues;
use crate::error::StoreError;
use crate::ports::KeyValueStore;

pub const DRAFT_KEY: &str = "roster.person_form_draft";
pub const DRAFT_VERSION: u32 = 1;
pub const DRAFT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub form_data: FormValues,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
}

impl Draft {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age.to_std().map(|age| age < DRAFT_MAX_AGE).unwrap_or(true)
    }
}

#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, values: &FormValues) -> Result<(), StoreError> {
        self.save_at(values, Utc::now()).await
    }

    pub async fn save_at(&self, values: &FormValues, at: DateTime<Utc>) -> Result<(), StoreError> {
        let draft = Draft {
            form_data: values.clone(),
            timestamp: at,
            version: DRAFT_VERSION,
        };
        let raw =
            serde_json::to_string(&draft).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(DRAFT_KEY, &raw, None).await
    }

    /// The saved values, if a draft younger than 24 hours exists.
    /// Stale, malformed or foreign-version drafts are removed.
    pub async fn restore(&self) -> Option<FormValues> {
        self.restore_at(Utc::now()).await
    }

    pub async fn restore_at(&self, now: DateTime<Utc>) -> Option<FormValues> {
        let raw = self.store.get(DRAFT_KEY).await?;

        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) if draft.version == DRAFT_VERSION && draft.is_fresh(now) => {
                tracing::debug!(saved_at = %draft.timestamp, "Restored form draft");
                Some(draft.form_data)
            }
            Ok(draft) => {
                tracing::info!(saved_at = %draft.timestamp, version = draft.version, "Discarding expired draft");
                self.discard().await;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable draft");
                self.discard().await;
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(DRAFT_KEY).await
    }

    async fn discard(&self) {
        if let Err(e) = self.clear().await {
            tracing::warn!(error = %e, "Failed to remove draft");
        }
    }
}
