//! Store and settings wiring.

use std::sync::Arc;

use salesbook_store::{
    DocumentBackend, FileKeyValueStore, HttpDocumentBackend, InvoiceStore, KeyValueStore, LocalInvoiceStore,
    RemoteInvoiceStore, SettingsStore, StoreConfig,
};

use crate::config::{AppConfig, BackendConfig};

pub type RemoteStore = RemoteInvoiceStore<Arc<dyn DocumentBackend>>;

/// Everything a command needs.
pub struct App {
    store: Arc<dyn InvoiceStore>,
    remote: Option<Arc<RemoteStore>>,
    settings: SettingsStore<Arc<dyn KeyValueStore>>,
}

impl App {
    pub async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir));
        tracing::debug!(data_dir = %config.data_dir.display(), "using data directory");

        let app = match &config.backend {
            BackendConfig::Local => Self::local(kv, config.store.clone()).await,
            BackendConfig::Remote { url, auth } => {
                let mut backend = HttpDocumentBackend::new(url.clone());
                if let Some(token) = auth {
                    backend = backend.with_auth(token.clone());
                }
                Self::remote(Arc::new(backend), kv, config.store.clone()).await
            }
        };
        Ok(app)
    }

    /// Invoices and settings in the same key/value store.
    pub async fn local(kv: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let store = LocalInvoiceStore::open(Arc::clone(&kv), config).await;
        Self {
            store: Arc::new(store),
            remote: None,
            settings: SettingsStore::new(kv),
        }
    }

    /// Invoices in a remote collection; settings stay local.
    pub async fn remote(backend: Arc<dyn DocumentBackend>, settings: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let remote = Arc::new(RemoteInvoiceStore::open(backend, config).await);
        Self {
            store: Arc::clone(&remote) as Arc<dyn InvoiceStore>,
            remote: Some(remote),
            settings: SettingsStore::new(settings),
        }
    }

    pub fn store(&self) -> &dyn InvoiceStore {
        self.store.as_ref()
    }

    /// Set when invoices live in a remote collection that needs polling.
    pub fn remote_store(&self) -> Option<&RemoteStore> {
        self.remote.as_deref()
    }

    pub fn settings(&self) -> &SettingsStore<Arc<dyn KeyValueStore>> {
        &self.settings
    }
}
