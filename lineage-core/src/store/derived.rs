//! Read-only views computed from the store's state on demand.

use indexmap::IndexMap;
use std::collections::HashSet;

use super::GraphStore;
use crate::graph::{GraphState, Node, Position};

/// Highlight tier the renderer applies to a person node, from its edge count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeEmphasis {
    None,
    Low,
    Medium,
    High,
}

impl EdgeEmphasis {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => EdgeEmphasis::None,
            1..=2 => EdgeEmphasis::Low,
            3..=4 => EdgeEmphasis::Medium,
            _ => EdgeEmphasis::High,
        }
    }
}

/// Edge endpoints per node. Every node appears, including those with no edges.
/// A self-loop counts twice; endpoints naming missing nodes are ignored.
pub fn edge_counts(state: &GraphState) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> =
        state.nodes.iter().map(|n| (n.id.clone(), 0)).collect();

    for edge in &state.edges {
        for endpoint in [&edge.source, &edge.target] {
            if let Some(count) = counts.get_mut(endpoint.as_str()) {
                *count += 1;
            }
        }
    }

    counts
}

/// Position in the top-level canvas frame, following parent links. Unresolved
/// links end the walk; a cycle is walked once.
pub fn absolute_position(state: &GraphState, node: &Node) -> Position {
    let mut position = node.position;
    let mut visited: HashSet<&str> = HashSet::from([node.id.as_str()]);
    let mut current = state.get_parent(node);

    while let Some(parent) = current {
        if !visited.insert(parent.id.as_str()) {
            break;
        }
        position = position.offset_by(parent.position);
        current = state.get_parent(parent);
    }

    position
}

impl GraphStore {
    pub fn derive_edge_counts(&self) -> IndexMap<String, usize> {
        edge_counts(self.state())
    }

    pub fn edge_emphasis(&self) -> IndexMap<String, EdgeEmphasis> {
        self.derive_edge_counts()
            .into_iter()
            .map(|(id, count)| (id, EdgeEmphasis::from_count(count)))
            .collect()
    }

    /// The focused node as it is now, so edits show up without re-focusing.
    pub fn focused_node(&self) -> Option<&Node> {
        self.selection()
            .focused()
            .and_then(|id| self.state().get_node_by_id(id))
    }

    /// The node's parent, or `None` when it has none or the link no longer resolves.
    pub fn resolve_parent(&self, node_id: &str) -> Option<&Node> {
        let node = self.state().get_node_by_id(node_id)?;
        self.state().get_parent(node)
    }

    pub fn group_members(&self, group_id: &str) -> Vec<&Node> {
        self.state().get_children(group_id)
    }

    pub fn absolute_position(&self, node_id: &str) -> Option<Position> {
        let node = self.state().get_node_by_id(node_id)?;
        Some(absolute_position(self.state(), node))
    }

    pub fn verify_integrity(&self) -> Result<(), Vec<String>> {
        self.state().verify_graph_integrity()
    }
}
