use crate::application::ports::{IdentityProvider, RemoteBackend};
use crate::application::services::{OfflineService, SyncService};
use crate::infrastructure::{LocalStore, PostgrestBackend, SessionIdentityProvider};
use crate::shared::config::AppConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Wires the local store, identity and remote adapter together.
pub struct AppState {
    pub config: AppConfig,
    pub store: LocalStore,
    pub identity: Arc<SessionIdentityProvider>,
    pub offline_service: Arc<OfflineService>,
    /// `None` until a remote backend is configured.
    pub sync_service: Option<Arc<SyncService>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;
        let identity = Arc::new(SessionIdentityProvider::from_env());
        Self::with_identity(config, identity).await
    }

    pub async fn with_identity(
        config: AppConfig,
        identity: Arc<SessionIdentityProvider>,
    ) -> anyhow::Result<Self> {
        let store = LocalStore::open(&config.database).await?;
        let identity_provider: Arc<dyn IdentityProvider> = identity.clone();

        let offline_service = Arc::new(OfflineService::new(
            store.records(),
            store.pending_log(),
            store.intent_writer(),
            identity_provider.clone(),
        ));

        let sync_service = if config.remote.base_url.is_some() {
            let remote: Arc<dyn RemoteBackend> = Arc::new(PostgrestBackend::new(
                &config.remote,
                identity_provider.clone(),
            )?);
            let service = SyncService::new(
                store.pending_log(),
                store.records(),
                remote,
                identity_provider,
            )
            .with_max_attempts(config.sync.max_attempts());
            Some(Arc::new(service))
        } else {
            info!("No remote backend configured; sync disabled");
            None
        };

        Ok(Self {
            config,
            store,
            identity,
            offline_service,
            sync_service,
        })
    }

    /// Starts the periodic sync loop when auto sync is on and a remote is configured.
    pub fn start_auto_sync(&self) -> Option<JoinHandle<()>> {
        if !self.config.sync.auto_sync {
            return None;
        }
        let sync = self.sync_service.as_ref()?;
        info!(interval_secs = self.config.sync.sync_interval, "Auto sync started");
        Some(sync.schedule(self.config.sync.interval()))
    }

    pub async fn shutdown(self) {
        self.store.close().await;
    }
}
