use std::sync::Arc;

use super::*;
use crate::errors::PersistenceResult;
use crate::graph::NodeKind;
use crate::persistence::{MemoryStore, PersistenceAdapter, PersistenceEvent, PersistenceWorker};

fn seeded() -> GraphStore {
    GraphStore::new(StoreConfig {
        rng_seed: Some(7),
        ..Default::default()
    })
}

/// Two measured people side by side: A at (0,0) and B at (200,0), both 100x50.
fn store_with_pair() -> GraphStore {
    let state = GraphState::new(
        vec![
            Node::person("a", Position::new(0.0, 0.0), NodeData::new("A"))
                .with_size(Size::new(100.0, 50.0)),
            Node::person("b", Position::new(200.0, 0.0), NodeData::new("B"))
                .with_size(Size::new(100.0, 50.0)),
        ],
        Vec::new(),
    );
    GraphStore::with_state(StoreConfig::default(), state).unwrap()
}

fn node<'a>(store: &'a GraphStore, id: &str) -> &'a Node {
    store.state().get_node_by_id(id).unwrap()
}

#[test]
fn test_add_node() {
    let mut store = seeded();
    let id = store.add_node(
        "Leonardo da Vinci",
        Some("Renaissance".to_string()),
        None,
        split_masterpieces("Mona Lisa, The Last Supper,"),
    );

    assert!(id.starts_with("node-"));
    let added = node(&store, &id);
    assert_eq!(added.kind, NodeKind::Person);
    assert_eq!(added.parent_id, None);
    assert_eq!(added.data.masterpieces, vec!["Mona Lisa", "The Last Supper"]);
    assert!((0.0..400.0).contains(&added.position.x));
    assert!((0.0..400.0).contains(&added.position.y));
}

#[test]
fn test_add_node_ids_are_unique() {
    let mut store = seeded();
    let first = store.add_node("A", None, None, Vec::new());
    let second = store.add_node("A", None, None, Vec::new());
    assert_ne!(first, second);
    assert_eq!(store.nodes().len(), 2);
}

#[test]
fn test_add_node_zero_canvas() {
    let mut store = GraphStore::new(StoreConfig {
        canvas_width: 0.0,
        canvas_height: 0.0,
        ..Default::default()
    });
    let id = store.add_node("A", None, None, Vec::new());
    assert_eq!(node(&store, &id).position, Position::new(0.0, 0.0));
}

#[test]
fn test_connect_copies_source_era() {
    let mut store = seeded();
    let a = store.add_node("A", Some("Baroque".to_string()), None, Vec::new());
    let b = store.add_node("B", Some("Renaissance".to_string()), None, Vec::new());

    let id = store.connect(&a, &b, RelationType::Rival, None).unwrap();
    assert!(id.starts_with(&format!("edge-{}-{}-", a, b)));

    let edge = store.state().get_edge_by_id(&id).unwrap();
    assert_eq!(edge.label, "rival");
    assert_eq!(edge.era.as_deref(), Some("Baroque"));

    // Later era edits do not flow into existing edges.
    store
        .update_node_data(
            &a,
            NodeDataPatch {
                era: Some("Mannerism".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.state().get_edge_by_id(&id).unwrap().era.as_deref(), Some("Baroque"));
}

#[test]
fn test_connect_self_loop_and_custom_label() {
    let mut store = seeded();
    let a = store.add_node("A", None, None, Vec::new());
    let id = store
        .connect(&a, &a, RelationType::Influence, Some("self-taught".to_string()))
        .unwrap();

    let edge = store.state().get_edge_by_id(&id).unwrap();
    assert!(edge.is_self_loop());
    assert_eq!(edge.label, "self-taught");
    assert_eq!(edge.era, None);
}

#[test]
fn test_connect_missing_endpoint() {
    let mut store = seeded();
    let a = store.add_node("A", None, None, Vec::new());

    let err = store.connect(&a, "ghost", RelationType::Friend, None).unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound(ref id) if id == "ghost"));
    let err = store.connect("ghost", &a, RelationType::Friend, None).unwrap_err();
    assert!(err.is_not_found());
    assert!(store.edges().is_empty());
}

#[test]
fn test_group_nodes_geometry() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();

    let group = node(&store, &group_id);
    assert!(group.is_group());
    assert_eq!(group.position, Position::new(-40.0, -40.0));
    assert_eq!(group.size, Some(Size::new(380.0, 130.0)));
    assert_eq!(group.data.label, DEFAULT_GROUP_LABEL);
    assert_eq!(group.data.description.as_deref(), Some(""));

    let a = node(&store, "a");
    assert_eq!(a.parent_id.as_deref(), Some(group_id.as_str()));
    assert_eq!(a.position, Position::new(40.0, 40.0));
    assert_eq!(node(&store, "b").position, Position::new(240.0, 40.0));

    // The group is appended after its members.
    assert_eq!(store.nodes().last().unwrap().id, group_id);
    assert_eq!(store.group_members(&group_id).len(), 2);
}

#[test]
fn test_group_nodes_uses_fallback_size() {
    let state = GraphState::new(
        vec![
            Node::person("a", Position::new(0.0, 0.0), NodeData::new("A")),
            Node::person("b", Position::new(100.0, 100.0), NodeData::new("B")),
        ],
        Vec::new(),
    );
    let mut store = GraphStore::with_state(StoreConfig::default(), state).unwrap();
    let group_id = store.group_nodes(["a", "b"]).unwrap();

    let group = node(&store, &group_id);
    assert_eq!(group.position, Position::new(-40.0, -40.0));
    assert_eq!(group.size, Some(Size::new(330.0, 230.0)));
}

#[test]
fn test_group_nodes_needs_two_ungrouped() {
    let mut store = store_with_pair();
    assert_eq!(store.group_nodes(["a"]), None);
    assert_eq!(store.group_nodes(["a", "ghost"]), None);

    let group_id = store.group_nodes(["a", "b"]).unwrap();
    let c = store.add_node("C", None, None, Vec::new());

    // a is already grouped, so only c is eligible.
    assert_eq!(store.group_nodes(["a", c.as_str()]), None);
    assert_eq!(node(&store, "a").parent_id.as_deref(), Some(group_id.as_str()));
    assert_eq!(store.nodes().iter().filter(|n| n.is_group()).count(), 1);
}

#[test]
fn test_group_nodes_clears_selection() {
    let mut store = store_with_pair();
    store.set_selection(["a", "b"], Vec::<String>::new());
    store.focus_node("a").unwrap();

    store.group_nodes(["a", "b"]).unwrap();
    assert!(store.selection().is_empty());
    assert!(store.focused_node().is_none());
}

#[test]
fn test_ungroup_round_trip() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();

    assert!(store.remove_from_group("a"));
    let a = node(&store, "a");
    assert_eq!(a.parent_id, None);
    assert_eq!(a.position, Position::new(0.0, 0.0));

    // The group itself is kept, even when it ends up with fewer than two members.
    assert!(store.state().contains_node(&group_id));
    assert!(!store.remove_from_group("a"));
    assert!(!store.remove_from_group("ghost"));
}

#[test]
fn test_remove_from_group_unresolved_parent() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();
    store.set_selection([group_id.as_str()], Vec::<String>::new());
    store.delete_selected();

    assert!(!store.remove_from_group("a"));
    assert_eq!(node(&store, "a").parent_id.as_deref(), Some(group_id.as_str()));
}

#[test]
fn test_move_node_into_group() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();
    let c = store.add_node("C", None, None, Vec::new());

    let joined = store.move_node(&c, Position::new(60.0, 10.0)).unwrap();
    assert_eq!(joined.as_deref(), Some(group_id.as_str()));

    let moved = node(&store, &c);
    assert_eq!(moved.parent_id.as_deref(), Some(group_id.as_str()));
    assert_eq!(moved.position, Position::new(100.0, 50.0));
    assert_eq!(store.absolute_position(&c), Some(Position::new(60.0, 10.0)));
}

#[test]
fn test_move_node_outside_groups() {
    let mut store = store_with_pair();
    store.group_nodes(["a", "b"]).unwrap();
    let c = store.add_node("C", None, None, Vec::new());

    assert_eq!(store.move_node(&c, Position::new(1000.0, 1000.0)).unwrap(), None);
    let moved = node(&store, &c);
    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.position, Position::new(1000.0, 1000.0));
}

#[test]
fn test_move_node_partially_inside_is_not_contained() {
    let mut store = store_with_pair();
    store.group_nodes(["a", "b"]).unwrap();
    let c = store.add_node("C", None, None, Vec::new());
    store
        .replace_nodes(
            store
                .nodes()
                .iter()
                .cloned()
                .map(|n| if n.id == c { n.with_size(Size::new(100.0, 50.0)) } else { n })
                .collect(),
        )
        .unwrap();

    // Group spans x in [-40, 340]; a 100 wide node at x=300 sticks out.
    assert_eq!(store.move_node(&c, Position::new(300.0, 0.0)).unwrap(), None);
}

#[test]
fn test_move_grouped_node_keeps_parent() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();

    assert_eq!(store.move_node("a", Position::new(5000.0, 5000.0)).unwrap(), None);
    let a = node(&store, "a");
    assert_eq!(a.parent_id.as_deref(), Some(group_id.as_str()));
    assert_eq!(a.position, Position::new(5000.0, 5000.0));
}

#[test]
fn test_move_group_into_own_descendant_is_skipped() {
    let state = GraphState::new(
        vec![
            Node::group("outer", Position::new(0.0, 0.0), Size::new(100.0, 100.0), NodeData::new("Outer")),
            Node::group("inner", Position::new(0.0, 0.0), Size::new(500.0, 500.0), NodeData::new("Inner"))
                .with_parent("outer"),
        ],
        Vec::new(),
    );
    let mut store = GraphStore::with_state(StoreConfig::default(), state).unwrap();

    assert_eq!(store.move_node("outer", Position::new(10.0, 10.0)).unwrap(), None);
    assert_eq!(node(&store, "outer").parent_id, None);
    assert!(store.verify_integrity().is_ok());
}

#[test]
fn test_move_node_first_group_in_store_order() {
    let state = GraphState::new(
        vec![
            Node::group("g1", Position::new(0.0, 0.0), Size::new(200.0, 200.0), NodeData::new("G1")),
            Node::group("g2", Position::new(0.0, 0.0), Size::new(300.0, 300.0), NodeData::new("G2")),
            Node::person("p", Position::new(900.0, 900.0), NodeData::new("P")),
        ],
        Vec::new(),
    );
    let mut store = GraphStore::with_state(StoreConfig::default(), state).unwrap();

    let joined = store.move_node("p", Position::new(50.0, 50.0)).unwrap();
    assert_eq!(joined.as_deref(), Some("g1"));
}

#[test]
fn test_move_missing_node() {
    let mut store = seeded();
    let err = store.move_node("ghost", Position::default()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_delete_leaves_dangling_edges() {
    let mut store = store_with_pair();
    let edge = store.connect("a", "b", RelationType::Friend, None).unwrap();
    store.set_selection(["a"], Vec::<String>::new());

    let summary = store.delete_selected();
    assert_eq!(summary, DeleteSummary { nodes_removed: 1, edges_removed: 0 });
    assert!(store.state().get_edge_by_id(&edge).is_some());
    assert!(store.verify_integrity().is_err());
    assert!(store.selection().is_empty());
}

#[test]
fn test_delete_prunes_dangling_edges_when_configured() {
    let mut store = store_with_pair();
    store.config.prune_dangling_edges = true;
    store.connect("a", "b", RelationType::Friend, None).unwrap();
    let c = store.add_node("C", None, None, Vec::new());
    let kept = store.connect("b", &c, RelationType::Patron, None).unwrap();
    store.set_selection(["a"], Vec::<String>::new());

    let summary = store.delete_selected();
    assert_eq!(summary, DeleteSummary { nodes_removed: 1, edges_removed: 1 });
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].id, kept);
    assert!(store.verify_integrity().is_ok());
}

#[test]
fn test_delete_selected_edges_only() {
    let mut store = store_with_pair();
    let edge = store.connect("a", "b", RelationType::Rival, None).unwrap();
    store.set_selection(Vec::<String>::new(), [edge.as_str(), "stale-edge"]);

    let summary = store.delete_selected();
    assert_eq!(summary.edges_removed, 1);
    assert_eq!(store.nodes().len(), 2);
}

#[test]
fn test_delete_group_orphans_children() {
    let mut store = store_with_pair();
    let group_id = store.group_nodes(["a", "b"]).unwrap();
    store.set_selection([group_id.as_str()], Vec::<String>::new());

    store.delete_selected();
    assert_eq!(store.nodes().len(), 2);
    assert!(store.resolve_parent("a").is_none());
    assert_eq!(node(&store, "a").parent_id.as_deref(), Some(group_id.as_str()));
}

#[test]
fn test_clear_all_requires_confirmation() {
    let mut store = store_with_pair();
    store.connect("a", "b", RelationType::Rival, None).unwrap();

    assert!(!store.clear_all(false));
    assert_eq!(store.nodes().len(), 2);

    assert!(store.clear_all(true));
    assert!(store.state().is_empty());
    assert!(store.selection().is_empty());
}

#[test]
fn test_update_node_data_reflects_in_focus() {
    let mut store = store_with_pair();
    store.focus_node("a").unwrap();

    store
        .update_node_data(
            "a",
            NodeDataPatch {
                description: Some("Painter".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let focused = store.focused_node().unwrap();
    assert_eq!(focused.data.label, "A");
    assert_eq!(focused.data.description.as_deref(), Some("Painter"));
}

#[test]
fn test_update_missing_node() {
    let mut store = seeded();
    let err = store
        .update_node_data("ghost", NodeDataPatch::default())
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[test]
fn test_focus_missing_node() {
    let mut store = store_with_pair();
    assert!(store.focus_node("ghost").is_err());
    store.focus_node("b").unwrap();
    store.clear_focus();
    assert!(store.focused_node().is_none());
}

#[test]
fn test_set_selection_is_idempotent() {
    let mut store = store_with_pair();
    store.set_selection(["a", "b"], ["e"]);
    let first = store.selection().clone();
    store.set_selection(["a", "b"], ["e"]);
    assert_eq!(store.selection(), &first);
}

#[test]
fn test_snapshot_is_detached() {
    let mut store = store_with_pair();
    let snapshot = store.snapshot();
    store.add_node("C", None, None, Vec::new());
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(store.nodes().len(), 3);
}

#[test]
fn test_load_snapshot_rejects_cycle() {
    let mut store = store_with_pair();
    let before = store.snapshot();
    let cyclic = GraphState::new(
        vec![
            Node::group("g1", Position::default(), Size::new(10.0, 10.0), NodeData::new("G1"))
                .with_parent("g2"),
            Node::group("g2", Position::default(), Size::new(10.0, 10.0), NodeData::new("G2"))
                .with_parent("g1"),
        ],
        Vec::new(),
    );

    let err = store.load_snapshot(cyclic).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected(_)));
    assert_eq!(err.error_code(), "CYCLE_DETECTED");
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_replace_nodes_rejects_person_parent() {
    let mut store = store_with_pair();
    let err = store
        .replace_nodes(vec![
            Node::person("a", Position::default(), NodeData::new("A")),
            Node::person("b", Position::default(), NodeData::new("B")).with_parent("a"),
        ])
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidParent { .. }));
    assert_eq!(store.nodes().len(), 2);
    assert_eq!(node(&store, "b").parent_id, None);
}

#[test]
fn test_replace_nodes_tolerates_missing_parent() {
    let mut store = seeded();
    store
        .replace_nodes(vec![
            Node::person("a", Position::default(), NodeData::new("A")).with_parent("gone"),
        ])
        .unwrap();
    assert!(store.resolve_parent("a").is_none());
}

#[test]
fn test_replace_edges_keeps_dangling() {
    let mut store = store_with_pair();
    store.replace_edges(vec![Edge::new("e1", "a", "ghost", RelationType::Patron)]);
    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.derive_edge_counts()["a"], 1);
}

#[test]
fn test_edge_emphasis() {
    let mut store = store_with_pair();
    store.connect("a", "b", RelationType::Rival, None).unwrap();
    store.connect("a", "a", RelationType::Influence, None).unwrap();

    let emphasis = store.edge_emphasis();
    assert_eq!(emphasis["a"], EdgeEmphasis::Medium);
    assert_eq!(emphasis["b"], EdgeEmphasis::Low);
}

#[test]
fn test_split_masterpieces() {
    assert_eq!(split_masterpieces(""), Vec::<String>::new());
    assert_eq!(
        split_masterpieces(" David ,  Pietà,,"),
        vec!["David".to_string(), "Pietà".to_string()]
    );
}

#[tokio::test]
async fn test_mutations_reach_persistence() {
    let memory = Arc::new(MemoryStore::new());
    let (handle, task) = PersistenceWorker::spawn(memory.clone());

    let mut store = store_with_pair();
    store.attach_persistence(handle);
    store.connect("a", "b", RelationType::Rival, None).unwrap();
    let expected = store.snapshot();

    drop(store.detach_persistence());
    task.await.unwrap();

    assert_eq!(memory.current().await, Some(expected));
}

struct FailingStore;

#[async_trait::async_trait]
impl PersistenceAdapter for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn load(&self) -> PersistenceResult<Option<GraphState>> {
        Ok(None)
    }

    async fn save(&self, _state: &GraphState) -> PersistenceResult<()> {
        Err(crate::errors::PersistenceError::Reconcile("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_persistence_failure_keeps_memory_state() {
    let (handle, task) = PersistenceWorker::spawn(Arc::new(FailingStore));
    let mut events = handle.subscribe();

    let mut store = store_with_pair();
    store.attach_persistence(handle);
    let id = store.add_node("C", None, None, Vec::new());

    assert!(matches!(
        events.recv().await.unwrap(),
        PersistenceEvent::SaveFailed { .. }
    ));
    assert!(store.state().contains_node(&id));
    assert!(store.is_persistent());

    drop(store);
    task.await.unwrap();
}

#[tokio::test]
async fn test_closed_worker_degrades_to_memory() {
    let (handle, task) = PersistenceWorker::spawn(Arc::new(MemoryStore::new()));
    task.abort();
    let _ = task.await;

    let mut store = store_with_pair();
    store.attach_persistence(handle);
    let id = store.add_node("C", None, None, Vec::new());

    assert!(store.state().contains_node(&id));
    assert!(!store.is_persistent());
}
