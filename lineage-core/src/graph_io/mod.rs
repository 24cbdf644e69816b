//! Snapshot import/export
//!
//! A snapshot on disk is two JSON arrays, one of nodes and one of edges, in the
//! shape the editor front end reads and writes:
//!
//! ```text
//! node: {id, type, position:{x,y}, width?, height?, parentNode?,
//!        data:{label, era?, description?, masterpieces?}}
//! edge: {id, source, target, label, type, data?:{relationType, era?}}
//! ```
//!
//! The `*Record` types here are that wire shape; conversion to and from the
//! store's model happens at this boundary so the store never sees raw JSON.

pub mod json_io;

use serde::{Deserialize, Serialize};

use crate::errors::{ImportExportError, ImportExportResult};
use crate::graph::{Edge, Node, NodeData, NodeKind, Position, RelationType, Size};

pub use json_io::{
    edges_to_json, export_snapshot, import_snapshot, nodes_to_json, parse_edges, parse_nodes,
    read_edges_file, read_nodes_file,
};

pub const NODES_FILE: &str = "nodes.json";
pub const EDGES_FILE: &str = "edges.json";

/// Edge `type` written on export; the front end renders every edge with the same component.
pub const EDGE_RENDER_TYPE: &str = "custom";

/// Export options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Pretty-print the JSON output
    pub prettify: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { prettify: true }
    }
}

/// Export operation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportResult {
    pub nodes_path: String,
    pub edges_path: String,
    pub nodes_exported: usize,
    pub edges_exported: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<String>,
    pub data: NodeDataRecord,
    /// Older exports kept group dimensions here rather than in width/height.
    #[serde(default, skip_serializing)]
    pub style: Option<serde_json::Value>,
}

fn default_node_type() -> String {
    NodeKind::Person.as_str().to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeDataRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masterpieces: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default = "default_edge_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeDataRecord>,
}

fn default_edge_type() -> String {
    EDGE_RENDER_TYPE.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
}

/// Map a wire `type` tag to a node kind. `custom` and `default` are the tags
/// the editor front end gives person nodes.
pub fn parse_node_kind(tag: &str) -> Option<NodeKind> {
    match tag {
        "person" | "custom" | "default" => Some(NodeKind::Person),
        "group" => Some(NodeKind::Group),
        _ => None,
    }
}

fn style_dimension(style: &Option<serde_json::Value>, key: &str) -> Option<f64> {
    style.as_ref()?.get(key)?.as_f64()
}

impl NodeRecord {
    /// Convert to the store's model. `index` is only used for error reporting.
    pub fn into_node(self, index: usize) -> ImportExportResult<Node> {
        let kind = parse_node_kind(&self.kind).ok_or_else(|| ImportExportError::UnknownNodeType {
            index,
            kind: self.kind.clone(),
        })?;

        let width = self.width.or_else(|| style_dimension(&self.style, "width"));
        let height = self.height.or_else(|| style_dimension(&self.style, "height"));
        let size = match (width, height) {
            (Some(width), Some(height)) => Some(Size::new(width, height)),
            _ => None,
        };

        Ok(Node {
            id: self.id,
            kind,
            position: self.position,
            size,
            parent_id: self.parent_node,
            data: NodeData {
                label: self.data.label,
                era: self.data.era,
                description: self.data.description,
                masterpieces: self.data.masterpieces.unwrap_or_default(),
            },
        })
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let masterpieces = if node.data.masterpieces.is_empty() && node.is_group() {
            None
        } else {
            Some(node.data.masterpieces.clone())
        };

        Self {
            id: node.id.clone(),
            kind: node.kind.as_str().to_string(),
            position: node.position,
            width: node.size.map(|s| s.width),
            height: node.size.map(|s| s.height),
            parent_node: node.parent_id.clone(),
            data: NodeDataRecord {
                label: node.data.label.clone(),
                era: node.data.era.clone(),
                description: node.data.description.clone(),
                masterpieces,
            },
            style: None,
        }
    }
}

impl EdgeRecord {
    pub fn into_edge(self) -> Edge {
        let data = self.data.unwrap_or_default();
        let relation = match data.relation_type {
            Some(relation) => RelationType::from(relation),
            None => RelationType::from(self.label.as_str()),
        };

        Edge {
            id: self.id,
            source: self.source,
            target: self.target,
            label: self.label,
            relation,
            era: data.era,
        }
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
            kind: EDGE_RENDER_TYPE.to_string(),
            data: Some(EdgeDataRecord {
                relation_type: Some(edge.relation.as_str().to_string()),
                era: edge.era.clone(),
            }),
        }
    }
}
