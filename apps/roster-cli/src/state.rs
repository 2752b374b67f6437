//! Application state - the wired client stack shared by all commands.

use std::sync::Arc;

use anyhow::{Context, bail};

use roster_core::api::{AuthApi, PeopleApi};
use roster_core::draft::DraftStore;
use roster_core::ports::{FileSource, HttpTransport, KeyValueStore};
use roster_core::{ApiClient, ClientError, NetworkMonitor};
use roster_infra::{FileStore, InMemoryStore, LocalFileSource, ReqwestTransport};

use crate::config::AppConfig;

/// How the network monitor is seeded before a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// `--offline`: never touch the network.
    Forced,
    /// Probe `GET /health` once.
    Probe,
    /// Assume online.
    Assume,
}

#[derive(Clone)]
pub struct AppState {
    pub network: NetworkMonitor,
    pub store: Arc<dyn KeyValueStore>,
    pub auth: AuthApi,
    pub people: PeopleApi,
    pub drafts: DraftStore,
    pub files: Arc<dyn FileSource>,
}

impl AppState {
    /// Build the state with appropriate implementations.
    pub fn new(config: &AppConfig, ephemeral: bool) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = if ephemeral {
            tracing::debug!("Using in-memory store");
            Arc::new(InMemoryStore::new())
        } else {
            Arc::new(FileStore::new(&config.data_dir))
        };

        let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
        Ok(Self::with_transport(config, Arc::new(transport), store))
    }

    /// Wire the client stack over an explicit transport and store.
    pub fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let network = NetworkMonitor::online();
        let client = ApiClient::new(config.client_config(), transport, store.clone(), network.clone());

        tracing::debug!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "Application state initialized");

        Self {
            network,
            store: store.clone(),
            auth: AuthApi::new(client.clone()),
            people: PeopleApi::new(client),
            drafts: DraftStore::new(store),
            files: Arc::new(LocalFileSource),
        }
    }

    /// Seed the network monitor.
    pub async fn connect(&self, connectivity: Connectivity) {
        match connectivity {
            Connectivity::Forced => self.network.set_online(false),
            Connectivity::Assume => self.network.set_online(true),
            Connectivity::Probe => match self.auth.health().await {
                Err(e @ (ClientError::Connection(_) | ClientError::Timeout(_))) => {
                    tracing::warn!(error = %e, "API unreachable, working offline");
                    self.network.set_online(false);
                }
                _ => self.network.set_online(true),
            },
        }
    }

    /// Fail fast instead of retrying against a network that is down.
    pub fn require_online(&self) -> anyhow::Result<()> {
        if !self.network.is_online() {
            bail!("{}", ClientError::Offline);
        }
        Ok(())
    }
}
