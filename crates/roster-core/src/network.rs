//! Network status tracking.
//!
//! One [`NetworkMonitor`] is built at startup and cloned into every component
//! that needs it. Clones share the same state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub is_online: bool,
    pub last_checked: DateTime<Utc>,
    pub retry_count: u32,
}

#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    tx: Arc<watch::Sender<NetworkStatus>>,
}

impl NetworkMonitor {
    pub fn new(is_online: bool) -> Self {
        let (tx, _rx) = watch::channel(NetworkStatus {
            is_online,
            last_checked: Utc::now(),
            retry_count: 0,
        });
        Self { tx: Arc::new(tx) }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn status(&self) -> NetworkStatus {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.tx.borrow().is_online
    }

    /// Online/offline signal from the environment.
    pub fn set_online(&self, is_online: bool) {
        self.tx.send_modify(|status| {
            if status.is_online != is_online {
                tracing::info!(is_online, "Network status changed");
            }
            status.is_online = is_online;
            status.last_checked = Utc::now();
        });
    }

    pub fn record_retry(&self) {
        self.tx.send_modify(|status| status.retry_count += 1);
    }

    pub fn reset_retries(&self) {
        self.tx.send_if_modified(|status| {
            let changed = status.retry_count != 0;
            status.retry_count = 0;
            changed
        });
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.tx.subscribe()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::online()
    }
}
