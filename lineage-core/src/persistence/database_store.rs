use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::debug;

use super::PersistenceAdapter;
use crate::errors::{GraphError, PersistenceError, PersistenceResult};
use crate::graph::GraphState;
use crate::services::{GraphQueryService, ReconcileService};

/// Keeps the snapshot in the relational schema. Each save makes the tables
/// mirror the snapshot. Edges without both endpoints and parent links that do
/// not resolve cannot be stored there and are dropped with a warning.
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_persistence_error(err: GraphError) -> PersistenceError {
    match err {
        GraphError::Database(db_err) => PersistenceError::Database(db_err),
        other => PersistenceError::Reconcile(other.to_string()),
    }
}

#[async_trait]
impl PersistenceAdapter for DatabaseStore {
    fn name(&self) -> &str {
        "database"
    }

    async fn load(&self) -> PersistenceResult<Option<GraphState>> {
        let state = GraphQueryService::new(self.db.clone())
            .load_state()
            .await
            .map_err(into_persistence_error)?;

        if state.is_empty() {
            debug!("Database holds no graph yet");
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn save(&self, state: &GraphState) -> PersistenceResult<()> {
        let summary = ReconcileService::new(self.db.clone())
            .replace_all(state)
            .await
            .map_err(into_persistence_error)?;

        debug!(
            "Stored {} nodes and {} edges ({} edges skipped)",
            summary.nodes, summary.edges, summary.edges_skipped
        );
        Ok(())
    }
}
