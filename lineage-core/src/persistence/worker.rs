use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::PersistenceAdapter;
use crate::errors::{PersistenceError, PersistenceResult};
use crate::graph::GraphState;

const EVENT_BUFFER: usize = 64;

/// Outcome of a background save, for anything that wants to surface
/// persistence warnings to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum PersistenceEvent {
    Saved { nodes: usize, edges: usize },
    SaveFailed { backend: String, message: String },
}

/// Sending side held by the store. Cheap to clone.
#[derive(Clone)]
pub struct PersistenceHandle {
    snapshots: mpsc::UnboundedSender<GraphState>,
    events: broadcast::Sender<PersistenceEvent>,
}

impl PersistenceHandle {
    /// Queue a snapshot for saving. Never blocks.
    pub fn notify(&self, state: GraphState) -> PersistenceResult<()> {
        self.snapshots
            .send(state)
            .map_err(|_| PersistenceError::WorkerClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.snapshots.is_closed()
    }
}

pub struct PersistenceWorker;

impl PersistenceWorker {
    /// Spawn the save loop on the current tokio runtime. The task ends once
    /// every handle has been dropped and the queue is drained.
    pub fn spawn(adapter: Arc<dyn PersistenceAdapter>) -> (PersistenceHandle, JoinHandle<()>) {
        let (snapshots, receiver) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let handle = PersistenceHandle {
            snapshots,
            events: events.clone(),
        };
        let task = tokio::spawn(Self::run(adapter, receiver, events));

        (handle, task)
    }

    async fn run(
        adapter: Arc<dyn PersistenceAdapter>,
        mut receiver: mpsc::UnboundedReceiver<GraphState>,
        events: broadcast::Sender<PersistenceEvent>,
    ) {
        while let Some(mut state) = receiver.recv().await {
            // Only the newest snapshot matters; skip anything superseded while we waited.
            let mut skipped = 0;
            while let Ok(newer) = receiver.try_recv() {
                state = newer;
                skipped += 1;
            }
            if skipped > 0 {
                debug!("Coalesced {} queued snapshots", skipped);
            }

            let event = match adapter.save(&state).await {
                Ok(()) => {
                    debug!(
                        "Persisted snapshot via {} ({} nodes, {} edges)",
                        adapter.name(),
                        state.nodes.len(),
                        state.edges.len()
                    );
                    PersistenceEvent::Saved {
                        nodes: state.nodes.len(),
                        edges: state.edges.len(),
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to persist snapshot via {}: {}. Changes remain in memory only",
                        adapter.name(),
                        err
                    );
                    PersistenceEvent::SaveFailed {
                        backend: adapter.name().to_string(),
                        message: err.to_string(),
                    }
                }
            };

            // No subscribers is fine.
            let _ = events.send(event);
        }

        debug!("Persistence worker for {} stopped", adapter.name());
    }
}
