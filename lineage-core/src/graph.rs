use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

pub use crate::geometry::{Position, Rect, Size};

/// Full node/edge state at a point in time. Order of both sequences is significant:
/// it is the store's iteration order and the order written to disk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphState {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn get_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn get_edge_by_id(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Nodes whose parent link names `parent_id`, in store order.
    pub fn get_children(&self, parent_id: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    /// The node's parent, if the link is set and still resolves.
    pub fn get_parent(&self, node: &Node) -> Option<&Node> {
        node.parent_id
            .as_deref()
            .and_then(|parent_id| self.get_node_by_id(parent_id))
    }

    /// True when `ancestor_id` is reachable by following `node_id`'s parent links.
    /// A node counts as its own ancestor. Stops on revisits so a broken chain
    /// cannot loop forever.
    pub fn is_ancestor(&self, ancestor_id: &str, node_id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(node_id.to_string());
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            if !visited.insert(id.clone()) {
                return false;
            }
            current = self.get_node_by_id(&id).and_then(|n| n.parent_id.clone());
        }
        false
    }

    /// First cycle found among parent links, as the chain of ids that closes it.
    pub fn find_parent_cycle(&self) -> Option<Vec<String>> {
        let mut cleared: HashSet<&str> = HashSet::new();

        for start in &self.nodes {
            let mut chain: IndexSet<&str> = IndexSet::new();
            let mut current = Some(start);

            while let Some(node) = current {
                if cleared.contains(node.id.as_str()) {
                    break;
                }
                if let Some(pos) = chain.get_index_of(node.id.as_str()) {
                    let mut cycle: Vec<String> =
                        chain.iter().skip(pos).map(|id| id.to_string()).collect();
                    cycle.push(node.id.clone());
                    return Some(cycle);
                }
                chain.insert(node.id.as_str());
                current = self.get_parent(node);
            }

            cleared.extend(chain);
        }

        None
    }

    pub fn set_node(&mut self, node: Node) {
        if let Some(existing) = self.get_node_mut(&node.id) {
            *existing = node;
        } else {
            self.nodes.push(node);
        }
    }

    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
    }

    pub fn stats(&self) -> String {
        format!(
            "Nodes: {}, Edges: {}, Groups: {}",
            self.nodes.len(),
            self.edges.len(),
            self.nodes.iter().filter(|n| n.is_group()).count()
        )
    }

    /// Collect every structural problem in the state. Dangling edges and
    /// unresolved parents are legal after a delete, so callers decide whether
    /// a non-empty report is fatal.
    pub fn verify_graph_integrity(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut node_id_set = HashSet::new();
        for node in &self.nodes {
            if !node_id_set.insert(node.id.as_str()) {
                errors.push(format!("Duplicate node id: {}", node.id));
            }
        }

        let mut edge_id_set = HashSet::new();
        for edge in &self.edges {
            if !edge_id_set.insert(edge.id.as_str()) {
                errors.push(format!("Duplicate edge id: {}", edge.id));
            }
        }

        for edge in &self.edges {
            if !node_id_set.contains(edge.source.as_str()) {
                errors.push(format!(
                    "Edge id:[{}] source {:?} not found in nodes",
                    edge.id, edge.source
                ));
            }
            if !node_id_set.contains(edge.target.as_str()) {
                errors.push(format!(
                    "Edge id:[{}] target {:?} not found in nodes",
                    edge.id, edge.target
                ));
            }
        }

        for node in &self.nodes {
            if let Some(parent_id) = &node.parent_id {
                match self.get_node_by_id(parent_id) {
                    None => errors.push(format!(
                        "Node id:[{}] parent {:?} not found in nodes",
                        node.id, parent_id
                    )),
                    Some(parent) if !parent.is_group() => errors.push(format!(
                        "Node id:[{}] parent {:?} is not a group",
                        node.id, parent_id
                    )),
                    Some(_) => {}
                }
            }
        }

        if let Some(cycle) = self.find_parent_cycle() {
            errors.push(format!("Parent cycle: {}", cycle.join(" -> ")));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            warn!("Graph integrity check found {} problems", errors.len());
            Err(errors)
        }
    }
}

/// Node tag. The renderer dispatches on this; the store only needs to know
/// whether a node can hold children.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Person,
    Group,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Person => "person",
            NodeKind::Group => "group",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
    pub label: String,
    pub era: Option<String>,
    pub description: Option<String>,
    pub masterpieces: Vec<String>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_era(mut self, era: impl Into<String>) -> Self {
        self.era = Some(era.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_masterpieces<I, S>(mut self, masterpieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.masterpieces = masterpieces.into_iter().map(Into::into).collect();
        self
    }

    /// Merge the fields present in `patch`; absent fields are left alone.
    pub fn apply(&mut self, patch: NodeDataPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(era) = patch.era {
            self.era = Some(era);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(masterpieces) = patch.masterpieces {
            self.masterpieces = masterpieces;
        }
    }
}

/// Partial payload for `GraphStore::update_node_data`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub era: Option<String>,
    pub description: Option<String>,
    pub masterpieces: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    pub size: Option<Size>,
    pub parent_id: Option<String>,
    pub data: NodeData,
}

impl Node {
    pub fn person(id: impl Into<String>, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Person,
            position,
            size: None,
            parent_id: None,
            data,
        }
    }

    pub fn group(id: impl Into<String>, position: Position, size: Size, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Group,
            position,
            size: Some(size),
            parent_id: None,
            data,
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Box in the node's own frame, substituting `fallback` when no size is known.
    pub fn bounds(&self, fallback: Size) -> Rect {
        Rect::new(self.position, self.size.unwrap_or(fallback))
    }
}

/// Relationship between two figures. Anything outside the known set is kept
/// as `Other`. Build values with `RelationType::from` rather than `Other`
/// directly so known names are not wrapped.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    Rival,
    MasterApprentice,
    Inheritance,
    Patron,
    Friend,
    Influence,
    Other(String),
}

impl RelationType {
    pub fn as_str(&self) -> &str {
        match self {
            RelationType::Rival => "rival",
            RelationType::MasterApprentice => "master_apprentice",
            RelationType::Inheritance => "inheritance",
            RelationType::Patron => "patron",
            RelationType::Friend => "friend",
            RelationType::Influence => "influence",
            RelationType::Other(label) => label,
        }
    }
}

/// Surrounding whitespace is dropped. A known name always parses to its
/// variant, so `Other` never holds one of them after a round trip.
impl From<&str> for RelationType {
    fn from(value: &str) -> Self {
        let value = value.trim();
        match value {
            "rival" => RelationType::Rival,
            "master_apprentice" => RelationType::MasterApprentice,
            "inheritance" => RelationType::Inheritance,
            "patron" => RelationType::Patron,
            "friend" => RelationType::Friend,
            "influence" => RelationType::Influence,
            _ => RelationType::Other(value.to_string()),
        }
    }
}

impl From<String> for RelationType {
    fn from(value: String) -> Self {
        RelationType::from(value.as_str())
    }
}

impl From<RelationType> for String {
    fn from(value: RelationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub relation: RelationType,
    /// Source node's era when the edge was created; not kept in sync.
    pub era: Option<String>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        relation: RelationType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: relation.as_str().to_string(),
            relation,
            era: None,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_graph() -> GraphState {
        GraphState::new(
            vec![
                Node::group(
                    "g1",
                    Position::new(0.0, 0.0),
                    Size::new(500.0, 300.0),
                    NodeData::new("Renaissance"),
                ),
                Node::person(
                    "leonardo",
                    Position::new(40.0, 40.0),
                    NodeData::new("Leonardo").with_era("Renaissance"),
                )
                .with_parent("g1"),
                Node::person(
                    "michelangelo",
                    Position::new(240.0, 40.0),
                    NodeData::new("Michelangelo").with_era("Renaissance"),
                )
                .with_parent("g1"),
                Node::person("vasari", Position::new(600.0, 0.0), NodeData::new("Vasari")),
            ],
            vec![
                Edge::new("e1", "leonardo", "michelangelo", RelationType::Rival),
                Edge::new("e2", "vasari", "michelangelo", RelationType::Other("biographer".into())),
            ],
        )
    }

    #[test]
    fn test_get_children() {
        let graph = create_test_graph();
        let children: Vec<&str> = graph.get_children("g1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["leonardo", "michelangelo"]);
        assert!(graph.get_children("vasari").is_empty());
    }

    #[test]
    fn test_get_parent() {
        let graph = create_test_graph();
        let leonardo = graph.get_node_by_id("leonardo").unwrap();
        assert_eq!(graph.get_parent(leonardo).unwrap().id, "g1");
        let vasari = graph.get_node_by_id("vasari").unwrap();
        assert!(graph.get_parent(vasari).is_none());
    }

    #[test]
    fn test_is_ancestor() {
        let graph = create_test_graph();
        assert!(graph.is_ancestor("g1", "leonardo"));
        assert!(graph.is_ancestor("leonardo", "leonardo"));
        assert!(!graph.is_ancestor("leonardo", "g1"));
    }

    #[test]
    fn test_verify_graph_integrity_ok() {
        assert!(create_test_graph().verify_graph_integrity().is_ok());
    }

    #[test]
    fn test_verify_graph_integrity_reports_problems() {
        let mut graph = create_test_graph();
        graph.remove_node("vasari");
        graph.nodes.push(
            Node::person("orphan", Position::default(), NodeData::new("Orphan")).with_parent("gone"),
        );
        graph.nodes.push(
            Node::person("under-person", Position::default(), NodeData::new("X"))
                .with_parent("leonardo"),
        );

        let errors = graph.verify_graph_integrity().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("source \"vasari\" not found")));
        assert!(errors.iter().any(|e| e.contains("parent \"gone\" not found")));
        assert!(errors.iter().any(|e| e.contains("is not a group")));
    }

    #[test]
    fn test_find_parent_cycle() {
        let mut graph = create_test_graph();
        assert!(graph.find_parent_cycle().is_none());

        graph.get_node_mut("g1").unwrap().parent_id = Some("g2".to_string());
        graph.nodes.push(
            Node::group("g2", Position::default(), Size::new(10.0, 10.0), NodeData::new("G2"))
                .with_parent("g1"),
        );

        let cycle = graph.find_parent_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.contains(&"g1".to_string()));
        assert!(cycle.contains(&"g2".to_string()));
    }

    #[test]
    fn test_relation_type_parsing() {
        assert_eq!(RelationType::from("master_apprentice"), RelationType::MasterApprentice);
        assert_eq!(RelationType::from("friend"), RelationType::Friend);
        assert_eq!(
            RelationType::from("biographer"),
            RelationType::Other("biographer".to_string())
        );
        assert_eq!(RelationType::Other("biographer".into()).as_str(), "biographer");
    }

    #[test]
    fn test_relation_type_serde_as_string() {
        let json = serde_json::to_string(&RelationType::Inheritance).unwrap();
        assert_eq!(json, "\"inheritance\"");
        let parsed: RelationType = serde_json::from_str("\"court painter\"").unwrap();
        assert_eq!(parsed, RelationType::Other("court painter".to_string()));
    }

    #[test]
    fn test_relation_type_trims_and_normalizes() {
        assert_eq!(
            RelationType::from("  court painter "),
            RelationType::Other("court painter".to_string())
        );
        assert_eq!(RelationType::from(" rival\n"), RelationType::Rival);

        let wrapped = serde_json::to_string(&RelationType::Other("patron".into())).unwrap();
        let parsed: RelationType = serde_json::from_str(&wrapped).unwrap();
        assert_eq!(parsed, RelationType::Patron);
    }

    #[test]
    fn test_node_data_apply_patch() {
        let mut data = NodeData::new("Leonardo").with_era("Renaissance");
        data.apply(NodeDataPatch {
            description: Some("Painter".to_string()),
            masterpieces: Some(vec!["Mona Lisa".to_string()]),
            ..Default::default()
        });

        assert_eq!(data.label, "Leonardo");
        assert_eq!(data.era.as_deref(), Some("Renaissance"));
        assert_eq!(data.description.as_deref(), Some("Painter"));
        assert_eq!(data.masterpieces, vec!["Mona Lisa"]);
    }

    #[test]
    fn test_set_node_upserts() {
        let mut graph = create_test_graph();
        let mut vasari = graph.get_node_by_id("vasari").unwrap().clone();
        vasari.data.label = "Giorgio Vasari".to_string();
        graph.set_node(vasari);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.get_node_by_id("vasari").unwrap().data.label, "Giorgio Vasari");

        graph.set_node(Node::person("new", Position::default(), NodeData::new("New")));
        assert_eq!(graph.nodes.len(), 5);
    }
}
