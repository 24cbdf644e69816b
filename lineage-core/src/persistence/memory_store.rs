use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::PersistenceAdapter;
use crate::errors::PersistenceResult;
use crate::graph::GraphState;

/// Keeps the last snapshot in memory. Used when no durable backend is configured
/// and in tests.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<GraphState>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(state: GraphState) -> Self {
        Self {
            snapshot: RwLock::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Option<GraphState> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> PersistenceResult<Option<GraphState>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, state: &GraphState) -> PersistenceResult<()> {
        *self.snapshot.write().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
