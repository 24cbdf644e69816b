//! The graph editing state machine.
//!
//! `GraphStore` is the single owner of the node/edge state and the selection.
//! Every mutation goes through one of its methods, runs synchronously to
//! completion, and either fully applies or returns an error with nothing
//! changed. Renderers read through [`GraphStore::state`] or take an owned copy
//! with [`GraphStore::snapshot`]; they never hold a second writable copy.

pub mod derived;
pub mod selection;

use indexmap::IndexSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::errors::{GraphError, GraphResult};
use crate::graph::{
    Edge, GraphState, Node, NodeData, NodeDataPatch, Position, Rect, RelationType, Size,
};
use crate::persistence::PersistenceHandle;

pub use derived::EdgeEmphasis;
pub use selection::Selection;

/// Label given to a freshly created group.
pub const DEFAULT_GROUP_LABEL: &str = "New Group";

/// What `delete_selected` removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

pub struct GraphStore {
    state: GraphState,
    selection: Selection,
    config: StoreConfig,
    rng: StdRng,
    persistence: Option<PersistenceHandle>,
}

impl GraphStore {
    pub fn new(config: StoreConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: GraphState::default(),
            selection: Selection::new(),
            config,
            rng,
            persistence: None,
        }
    }

    /// Start from an existing snapshot, e.g. one loaded from storage.
    pub fn with_state(config: StoreConfig, state: GraphState) -> GraphResult<Self> {
        let mut store = Self::new(config);
        store.load_snapshot(state)?;
        Ok(store)
    }

    /// Send a snapshot to `handle` after every committed node/edge mutation.
    pub fn attach_persistence(&mut self, handle: PersistenceHandle) {
        self.persistence = Some(handle);
    }

    pub fn detach_persistence(&mut self) -> Option<PersistenceHandle> {
        self.persistence.take()
    }

    pub fn persistence_handle(&self) -> Option<&PersistenceHandle> {
        self.persistence.as_ref()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn nodes(&self) -> &[Node] {
        &self.state.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.state.edges
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Owned copy of the current state. Later mutations do not affect it.
    pub fn snapshot(&self) -> GraphState {
        self.state.clone()
    }

    /// Create a person node at a random spot on the canvas. Never fails; label
    /// validation belongs to whoever collects the input.
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        era: Option<String>,
        description: Option<String>,
        masterpieces: Vec<String>,
    ) -> String {
        let id = new_id("node");
        let position = Position::new(
            random_coordinate(&mut self.rng, self.config.canvas_width),
            random_coordinate(&mut self.rng, self.config.canvas_height),
        );
        let data = NodeData {
            label: label.into(),
            era,
            description,
            masterpieces,
        };

        self.state.nodes.push(Node::person(id.clone(), position, data));
        debug!("Added node {} at ({:.1}, {:.1})", id, position.x, position.y);
        self.commit("add_node");
        id
    }

    /// Create an edge between two existing nodes. The edge's era is copied from
    /// the source node now and not kept in sync afterwards.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        relation: RelationType,
        label: Option<String>,
    ) -> GraphResult<String> {
        let source_node = self
            .state
            .get_node_by_id(source)
            .ok_or_else(|| GraphError::NodeNotFound(source.to_string()))?;
        if !self.state.contains_node(target) {
            return Err(GraphError::NodeNotFound(target.to_string()));
        }

        let era = source_node.data.era.clone();
        let id = format!("edge-{}-{}-{}", source, target, Uuid::new_v4());
        let label = label.unwrap_or_else(|| relation.as_str().to_string());

        self.state.edges.push(Edge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            label,
            relation,
            era,
        });
        debug!("Connected {} -> {} as {}", source, target, id);
        self.commit("connect");
        Ok(id)
    }

    /// Move a node. A node without a parent that ends up fully inside a group
    /// joins the first such group in store order and is translated into its
    /// frame. Returns the id of the group joined, if any.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> GraphResult<Option<String>> {
        let node = self
            .state
            .get_node_by_id(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        let mut moved = node.clone();
        moved.position = position;

        let container = if moved.parent_id.is_none() {
            self.find_containing_group(&moved)
        } else {
            None
        };

        if let Some((group_id, origin)) = &container {
            moved.parent_id = Some(group_id.clone());
            moved.position = position.relative_to(*origin);
            debug!("Node {} dropped into group {}", node_id, group_id);
        }

        self.state.set_node(moved);
        self.commit("move_node");
        Ok(container.map(|(group_id, _)| group_id))
    }

    fn find_containing_group(&self, node: &Node) -> Option<(String, Position)> {
        // Unmeasured nodes are treated as a point at their position.
        let node_box = node.bounds(Size::default());

        let candidates: Vec<&Node> = self
            .state
            .nodes
            .iter()
            .filter(|g| g.is_group() && g.id != node.id)
            .filter(|g| g.bounds(Size::default()).contains(&node_box))
            .collect();

        if candidates.len() > 1 {
            debug!(
                "Node {} fits in {} groups; taking the first in store order",
                node.id,
                candidates.len()
            );
        }

        candidates
            .into_iter()
            .find(|g| {
                // Joining a group nested inside this node would close a parent cycle.
                let creates_cycle = self.state.is_ancestor(&node.id, &g.id);
                if creates_cycle {
                    debug!("Skipping group {}: it is nested inside {}", g.id, node.id);
                }
                !creates_cycle
            })
            .map(|g| (g.id.clone(), g.position))
    }

    /// Wrap at least two ungrouped nodes in a new group sized to their padded
    /// bounding box. Ids that are unknown or already grouped are ignored; with
    /// fewer than two eligible nodes nothing happens. Clears the selection.
    pub fn group_nodes<I, S>(&mut self, node_ids: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requested: IndexSet<String> = node_ids.into_iter().map(Into::into).collect();
        let fallback = Size::new(self.config.default_node_width, self.config.default_node_height);

        let members: Vec<&Node> = self
            .state
            .nodes
            .iter()
            .filter(|n| requested.contains(&n.id) && n.parent_id.is_none())
            .collect();

        if members.len() < 2 {
            debug!(
                "Not grouping: {} of {} requested nodes are ungrouped",
                members.len(),
                requested.len()
            );
            return None;
        }

        let bounds = Rect::bounding(members.iter().map(|n| n.bounds(fallback)))?
            .padded(self.config.group_padding);
        let member_ids: HashSet<String> = members.iter().map(|n| n.id.clone()).collect();
        let group_id = new_id("group");

        for node in self.state.nodes.iter_mut() {
            if member_ids.contains(&node.id) {
                node.parent_id = Some(group_id.clone());
                node.position = node.position.relative_to(bounds.origin);
            }
        }

        self.state.nodes.push(Node::group(
            group_id.clone(),
            bounds.origin,
            bounds.size,
            NodeData::new(DEFAULT_GROUP_LABEL).with_description(""),
        ));

        self.selection.clear();
        debug!("Grouped {} nodes into {}", member_ids.len(), group_id);
        self.commit("group_nodes");
        Some(group_id)
    }

    /// Take a node out of its group, back into the parent's enclosing frame.
    /// Only one level is undone. Returns false when there was nothing to do.
    pub fn remove_from_group(&mut self, node_id: &str) -> bool {
        let Some(node) = self.state.get_node_by_id(node_id) else {
            return false;
        };
        let Some(parent) = self.state.get_parent(node) else {
            return false;
        };
        let origin = parent.position;

        let Some(node) = self.state.get_node_mut(node_id) else {
            return false;
        };
        node.parent_id = None;
        node.position = node.position.offset_by(origin);

        debug!("Removed node {} from its group", node_id);
        self.commit("remove_from_group");
        true
    }

    /// Delete everything selected. Edges left pointing at a deleted node are
    /// kept unless `prune_dangling_edges` is set. Children of a deleted group
    /// keep their now unresolvable parent link.
    pub fn delete_selected(&mut self) -> DeleteSummary {
        let node_ids = self.selection.node_ids().clone();
        let edge_ids = self.selection.edge_ids().clone();

        let nodes_before = self.state.nodes.len();
        let edges_before = self.state.edges.len();

        self.state.nodes.retain(|n| !node_ids.contains(&n.id));
        self.state.edges.retain(|e| !edge_ids.contains(&e.id));
        if self.config.prune_dangling_edges {
            self.state
                .edges
                .retain(|e| !node_ids.contains(&e.source) && !node_ids.contains(&e.target));
        }

        let summary = DeleteSummary {
            nodes_removed: nodes_before - self.state.nodes.len(),
            edges_removed: edges_before - self.state.edges.len(),
        };

        self.selection.clear();
        debug!(
            "Deleted {} nodes and {} edges",
            summary.nodes_removed, summary.edges_removed
        );
        self.commit("delete_selected");
        summary
    }

    /// Remove every node and edge. The caller must have asked the user first;
    /// without `confirmed` nothing happens.
    pub fn clear_all(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            debug!("clear_all called without confirmation; ignoring");
            return false;
        }

        self.state = GraphState::default();
        self.selection.clear();
        self.commit("clear_all");
        true
    }

    /// Merge `patch` into a node's data.
    pub fn update_node_data(&mut self, node_id: &str, patch: NodeDataPatch) -> GraphResult<()> {
        let node = self
            .state
            .get_node_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        node.data.apply(patch);
        debug!("Updated data of node {}", node_id);
        self.commit("update_node_data");
        Ok(())
    }

    /// Replace the selection. Ids are not checked; a stale id simply matches nothing.
    pub fn set_selection<N, E>(&mut self, node_ids: N, edge_ids: E)
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        self.selection.set(node_ids, edge_ids);
    }

    /// Focus a node for detail display.
    pub fn focus_node(&mut self, node_id: &str) -> GraphResult<()> {
        if !self.state.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id.to_string()));
        }
        self.selection.focus(node_id);
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.selection.clear_focus();
    }

    /// Replace every node, e.g. from an uploaded file. Parent links are checked
    /// before anything changes.
    pub fn replace_nodes(&mut self, nodes: Vec<Node>) -> GraphResult<()> {
        validate_parent_links(&nodes)?;
        self.state.nodes = nodes;
        self.selection.clear();
        self.commit("replace_nodes");
        Ok(())
    }

    /// Replace every edge. Edges are taken as-is; dangling endpoints are allowed.
    pub fn replace_edges(&mut self, edges: Vec<Edge>) {
        self.state.edges = edges;
        self.selection.clear();
        self.commit("replace_edges");
    }

    /// Adopt a snapshot read from storage. Does not notify persistence, since
    /// the snapshot came from there.
    pub fn load_snapshot(&mut self, state: GraphState) -> GraphResult<()> {
        validate_parent_links(&state.nodes)?;
        self.state = state;
        self.selection.clear();
        debug!("Loaded snapshot: {}", self.state.stats());
        Ok(())
    }

    fn commit(&mut self, operation: &str) {
        debug!("{} committed; {}", operation, self.state.stats());

        let failed = match &self.persistence {
            Some(handle) => handle.notify(self.state.clone()).err(),
            None => None,
        };

        if let Some(err) = failed {
            warn!("{} after {}; continuing in memory only", err, operation);
            self.persistence = None;
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Reject parent links that point at a non-group node or form a cycle. Links to
/// ids that are not present are tolerated: they are what deleting a group leaves behind.
pub fn validate_parent_links(nodes: &[Node]) -> GraphResult<()> {
    let state = GraphState::new(nodes.to_vec(), Vec::new());

    for node in &state.nodes {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        match state.get_node_by_id(parent_id) {
            Some(parent) if !parent.is_group() => {
                return Err(GraphError::InvalidParent {
                    node: node.id.clone(),
                    parent: parent_id.clone(),
                    reason: format!("parent is a {} node, not a group", parent.kind),
                });
            }
            Some(_) => {}
            None => warn!(
                "Node {} refers to missing parent {}; treating it as ungrouped",
                node.id, parent_id
            ),
        }
    }

    if let Some(cycle) = state.find_parent_cycle() {
        return Err(GraphError::CycleDetected(cycle.join(" -> ")));
    }

    Ok(())
}

/// Split the comma separated list the add-node form collects.
pub fn split_masterpieces(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn random_coordinate(rng: &mut StdRng, extent: f64) -> f64 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests;
