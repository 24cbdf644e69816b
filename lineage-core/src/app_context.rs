use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{LineageConfig, StorageBackend, StorageConfig};
use crate::persistence::{
    FileStore, MemoryStore, PersistenceAdapter, PersistenceEvent, PersistenceWorker,
};
use crate::store::GraphStore;

/// A store wired to the storage backend named in the config: the last saved
/// snapshot is loaded on open, and every later mutation is saved in the background.
///
/// If the saved snapshot cannot be read the context starts empty and in memory
/// only, so the unreadable data is never overwritten. `load_error` says why.
pub struct AppContext {
    store: GraphStore,
    adapter: Arc<dyn PersistenceAdapter>,
    worker: Option<JoinHandle<()>>,
    load_error: Option<String>,
}

impl AppContext {
    /// Must be called inside a tokio runtime; the persistence worker is spawned on it.
    pub async fn open(config: &LineageConfig) -> Result<Self> {
        let adapter = open_adapter(&config.storage).await?;
        Self::with_adapter(config, adapter).await
    }

    pub async fn with_adapter(
        config: &LineageConfig,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> Result<Self> {
        let mut store = GraphStore::new(config.store.clone());

        match adapter.load().await {
            Ok(Some(snapshot)) => {
                store
                    .load_snapshot(snapshot)
                    .with_context(|| format!("Stored graph in {} is invalid", adapter.name()))?;
                info!("Loaded graph from {}: {}", adapter.name(), store.state().stats());
            }
            Ok(None) => info!("No saved graph in {}; starting empty", adapter.name()),
            Err(err) => {
                warn!(
                    "Could not load saved graph from {}: {}. Starting empty; changes stay in memory only",
                    adapter.name(),
                    err
                );
                return Ok(Self {
                    store,
                    adapter,
                    worker: None,
                    load_error: Some(err.to_string()),
                });
            }
        }

        let (handle, worker) = PersistenceWorker::spawn(adapter.clone());
        store.attach_persistence(handle);

        Ok(Self {
            store,
            adapter,
            worker: Some(worker),
            load_error: None,
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn backend_name(&self) -> &str {
        self.adapter.name()
    }

    /// Why the saved snapshot could not be loaded, if it could not.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Edits are not being saved: either the saved snapshot was unreadable or
    /// the persistence worker has gone away.
    pub fn is_degraded(&self) -> bool {
        !self.store.is_persistent()
    }

    /// Save outcomes, for surfacing failures to the user. `None` once the store
    /// has fallen back to memory only.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<PersistenceEvent>> {
        self.store.persistence_handle().map(|h| h.subscribe())
    }

    /// Stop accepting snapshots and wait for the last one to be written.
    pub async fn shutdown(mut self) -> Result<GraphStore> {
        drop(self.store.detach_persistence());
        if let Some(worker) = self.worker.take() {
            worker.await.context("Persistence worker panicked")?;
        }
        Ok(self.store)
    }
}

/// Build the adapter for the configured backend. The database backend is
/// migrated before use.
pub async fn open_adapter(storage: &StorageConfig) -> Result<Arc<dyn PersistenceAdapter>> {
    let adapter: Arc<dyn PersistenceAdapter> = match storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::new(storage.data_dir.clone())),
        #[cfg(feature = "database")]
        StorageBackend::Database => {
            let db = crate::database::connection::open_database(Some(&storage.database))
                .await
                .with_context(|| format!("Failed to open database {:?}", storage.database))?;
            Arc::new(crate::persistence::DatabaseStore::new(db))
        }
        #[cfg(not(feature = "database"))]
        StorageBackend::Database => {
            anyhow::bail!("Database storage requires the `database` feature")
        }
    };

    Ok(adapter)
}
