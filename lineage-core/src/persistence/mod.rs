//! Snapshot persistence
//!
//! The store never waits on storage. After each committed node/edge mutation it
//! hands a snapshot to a [`PersistenceHandle`]; a [`PersistenceWorker`] task
//! drains the queue, keeps only the newest snapshot, and writes it through a
//! [`PersistenceAdapter`]. Failures are logged and broadcast as
//! [`PersistenceEvent::SaveFailed`]; the in-memory state is never rolled back.

pub mod file_store;
pub mod memory_store;
pub mod worker;

#[cfg(feature = "database")]
pub mod database_store;

use async_trait::async_trait;

use crate::errors::PersistenceResult;
use crate::graph::GraphState;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use worker::{PersistenceEvent, PersistenceHandle, PersistenceWorker};

#[cfg(feature = "database")]
pub use database_store::DatabaseStore;

/// Durable home for a whole-graph snapshot.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Previously saved snapshot, or `None` if nothing has been saved yet.
    async fn load(&self) -> PersistenceResult<Option<GraphState>>;

    /// Replace the stored snapshot with `state`.
    async fn save(&self, state: &GraphState) -> PersistenceResult<()>;
}
