use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::PersistenceAdapter;
use crate::errors::PersistenceResult;
use crate::graph::GraphState;
use crate::graph_io::{
    edges_to_json, nodes_to_json, parse_edges, parse_nodes, ExportOptions, EDGES_FILE, NODES_FILE,
};

/// Stores the snapshot as `nodes.json` and `edges.json` in a directory, one
/// file per collection like the browser's two local-storage keys.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_optional(path: &Path) -> PersistenceResult<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl PersistenceAdapter for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> PersistenceResult<Option<GraphState>> {
        let nodes = Self::read_optional(&self.dir.join(NODES_FILE)).await?;
        let edges = Self::read_optional(&self.dir.join(EDGES_FILE)).await?;

        if nodes.is_none() && edges.is_none() {
            debug!("No saved snapshot in {}", self.dir.display());
            return Ok(None);
        }

        // Either collection may have been saved alone; the missing one starts empty.
        let nodes = match nodes {
            Some(content) => parse_nodes(&content)?,
            None => Vec::new(),
        };
        let edges = match edges {
            Some(content) => parse_edges(&content)?,
            None => Vec::new(),
        };

        Ok(Some(GraphState::new(nodes, edges)))
    }

    async fn save(&self, state: &GraphState) -> PersistenceResult<()> {
        let options = ExportOptions { prettify: false };
        let nodes_json = nodes_to_json(&state.nodes, &options)?;
        let edges_json = edges_to_json(&state.edges, &options)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(NODES_FILE), nodes_json).await?;
        tokio::fs::write(self.dir.join(EDGES_FILE), edges_json).await?;

        debug!(
            "Saved {} nodes and {} edges to {}",
            state.nodes.len(),
            state.edges.len(),
            self.dir.display()
        );
        Ok(())
    }
}
