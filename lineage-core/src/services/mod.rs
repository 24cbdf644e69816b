pub mod graph_query_service;
pub mod reconcile_service;

pub use graph_query_service::{GraphQueryService, NewNode, NodeWithRelations};
pub use reconcile_service::{ReconcileService, ReconcileSummary, DEFAULT_DATA_SET};

use tracing::warn;

use crate::database::entities::{edges, nodes};
use crate::graph::{Edge, Node, NodeData, NodeKind, Position, RelationType, Size};
use crate::graph_io::parse_node_kind;

/// Rebuild a store node from its row. `era` is the era's name, resolved by the caller.
pub(crate) fn node_from_model(model: &nodes::Model, era: Option<String>) -> Node {
    let kind = parse_node_kind(&model.node_type).unwrap_or_else(|| {
        warn!(
            "Node {} has unknown type {:?}; loading it as a person",
            model.id, model.node_type
        );
        NodeKind::Person
    });

    let size = match (model.width, model.height) {
        (Some(width), Some(height)) => Some(Size::new(width, height)),
        _ => None,
    };

    Node {
        id: model.id.clone(),
        kind,
        position: Position::new(model.position_x, model.position_y),
        size,
        parent_id: model.parent_node_id.clone(),
        data: NodeData {
            label: model.label.clone(),
            era,
            description: model.description.clone(),
            masterpieces: model.masterpiece_list(),
        },
    }
}

pub(crate) fn edge_from_model(model: &edges::Model, era: Option<String>) -> Edge {
    Edge {
        id: model.id.clone(),
        source: model.source_node_id.clone(),
        target: model.target_node_id.clone(),
        label: model.label.clone(),
        relation: RelationType::from(model.relation_type.as_str()),
        era,
    }
}
