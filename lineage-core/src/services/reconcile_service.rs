use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::node_from_model;
use crate::database::entities::{data_sets, edges, eras, nodes};
use crate::errors::{GraphError, GraphResult};
use crate::graph::{Edge, GraphState, Node};

/// Data set every era is filed under.
pub const DEFAULT_DATA_SET: &str = "Default Set";

/// Row counts touched by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub eras: usize,
    pub nodes: usize,
    pub parents_linked: usize,
    pub parents_skipped: usize,
    pub edges: usize,
    pub edges_skipped: usize,
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

/// Writes node/edge sets into the database in one transaction.
///
/// Nodes are upserted without parent links first and linked in a second pass,
/// so the input order does not matter. Running the same input twice leaves the
/// same rows behind.
pub struct ReconcileService {
    db: DatabaseConnection,
}

impl ReconcileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upsert `nodes` and `edges`. Rows not mentioned are left alone.
    pub async fn reconcile(&self, nodes: &[Node], edges: &[Edge]) -> GraphResult<ReconcileSummary> {
        check_input_cycles(nodes)?;

        let txn = self.db.begin().await?;
        let summary = apply(
            &txn,
            nodes,
            edges,
            EdgeEraSource::SourceNode,
            ReconcileSummary::default(),
        )
        .await?;
        txn.commit().await?;

        info!(
            "Reconciled {} eras, {} nodes ({} parent links), {} edges",
            summary.eras, summary.nodes, summary.parents_linked, summary.edges
        );
        Ok(summary)
    }

    /// Make the database mirror `state`: rows absent from it are deleted and
    /// everything else is reconciled. Edges keep the era they carry instead of
    /// taking their source node's current one.
    pub async fn replace_all(&self, state: &GraphState) -> GraphResult<ReconcileSummary> {
        check_input_cycles(&state.nodes)?;

        let node_ids: Vec<String> = state.nodes.iter().map(|n| n.id.clone()).collect();
        let edge_ids: Vec<String> = state.edges.iter().map(|e| e.id.clone()).collect();

        let txn = self.db.begin().await?;

        let removed_edges = edges::Entity::delete_many()
            .filter(edges::Column::Id.is_not_in(edge_ids))
            .exec(&txn)
            .await?;
        let removed_nodes = nodes::Entity::delete_many()
            .filter(nodes::Column::Id.is_not_in(node_ids))
            .exec(&txn)
            .await?;

        let summary = ReconcileSummary {
            nodes_removed: removed_nodes.rows_affected as usize,
            edges_removed: removed_edges.rows_affected as usize,
            ..Default::default()
        };
        let summary = apply(&txn, &state.nodes, &state.edges, EdgeEraSource::Edge, summary).await?;
        txn.commit().await?;

        debug!(
            "Replaced stored graph: {} nodes, {} edges ({} nodes and {} edges removed)",
            summary.nodes, summary.edges, summary.nodes_removed, summary.edges_removed
        );
        Ok(summary)
    }
}

/// Where an edge's era comes from when it is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeEraSource {
    /// The source node's era, as seeding does.
    SourceNode,
    /// The era recorded on the edge when it was created.
    Edge,
}

fn check_input_cycles(nodes: &[Node]) -> GraphResult<()> {
    let state = GraphState::new(nodes.to_vec(), Vec::new());
    match state.find_parent_cycle() {
        Some(cycle) => Err(GraphError::CycleDetected(cycle.join(" -> "))),
        None => Ok(()),
    }
}

async fn apply(
    txn: &DatabaseTransaction,
    nodes: &[Node],
    edges: &[Edge],
    edge_eras: EdgeEraSource,
    mut summary: ReconcileSummary,
) -> GraphResult<ReconcileSummary> {
    let now = Utc::now();

    let data_set = ensure_data_set(txn, DEFAULT_DATA_SET, now).await?;

    let mut era_names: IndexSet<&str> = nodes
        .iter()
        .filter_map(|n| n.data.era.as_deref())
        .collect();
    if edge_eras == EdgeEraSource::Edge {
        era_names.extend(edges.iter().filter_map(|e| e.era.as_deref()));
    }
    era_names.retain(|name| !name.trim().is_empty());
    let mut era_ids: HashMap<String, i32> = HashMap::new();
    for name in era_names {
        let era = ensure_era(txn, name, data_set.id, now).await?;
        era_ids.insert(name.to_string(), era.id);
    }
    summary.eras = era_ids.len();

    // Pass 1: every node, unlinked.
    for (index, node) in nodes.iter().enumerate() {
        let era_id = era_id_for(&era_ids, node.data.era.as_deref());
        upsert_node(txn, node, era_id, index as i32, now).await?;
    }
    summary.nodes = nodes.len();

    // Pass 2: parent links, checked against everything now stored.
    let links = resolve_parent_links(txn, nodes, &mut summary).await?;
    for (node_id, parent_id) in &links {
        nodes::ActiveModel {
            id: Set(node_id.clone()),
            parent_node_id: Set(Some(parent_id.clone())),
            ..Default::default()
        }
        .update(txn)
        .await?;
    }
    summary.parents_linked = links.len();

    let input_eras: HashMap<&str, Option<i32>> = nodes
        .iter()
        .map(|n| (n.id.as_str(), era_id_for(&era_ids, n.data.era.as_deref())))
        .collect();
    for (index, edge) in edges.iter().enumerate() {
        let source_era = match input_eras.get(edge.source.as_str()) {
            Some(era_id) => Some(*era_id),
            None => nodes::Entity::find_by_id(edge.source.clone())
                .one(txn)
                .await?
                .map(|row| row.era_id),
        };
        let target_stored = input_eras.contains_key(edge.target.as_str())
            || nodes::Entity::find_by_id(edge.target.clone())
                .one(txn)
                .await?
                .is_some();

        match source_era {
            Some(source_era_id) if target_stored => {
                let era_id = match edge_eras {
                    EdgeEraSource::SourceNode => source_era_id,
                    EdgeEraSource::Edge => era_id_for(&era_ids, edge.era.as_deref()),
                };
                upsert_edge(txn, edge, era_id, index as i32, now).await?;
                summary.edges += 1;
            }
            _ => {
                warn!(
                    "Skipping edge {}: {} -> {} does not connect two stored nodes",
                    edge.id, edge.source, edge.target
                );
                summary.edges_skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Parent links to write, after checking each parent is a stored group and
/// that the links together with the stored ones stay acyclic.
async fn resolve_parent_links(
    txn: &DatabaseTransaction,
    nodes: &[Node],
    summary: &mut ReconcileSummary,
) -> GraphResult<IndexMap<String, String>> {
    let stored = nodes::Entity::find().all(txn).await?;
    let mut graph = GraphState::new(
        stored.iter().map(|row| node_from_model(row, None)).collect(),
        Vec::new(),
    );

    let mut links = IndexMap::new();
    for node in nodes {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        match graph.get_node_by_id(parent_id) {
            None => {
                warn!(
                    "Parent {} of node {} does not exist; leaving it unlinked",
                    parent_id, node.id
                );
                summary.parents_skipped += 1;
            }
            Some(parent) if !parent.is_group() => {
                return Err(GraphError::InvalidParent {
                    node: node.id.clone(),
                    parent: parent_id.clone(),
                    reason: format!("parent is a {} node, not a group", parent.kind),
                });
            }
            Some(_) => {
                links.insert(node.id.clone(), parent_id.clone());
            }
        }
    }

    for (node_id, parent_id) in &links {
        if let Some(node) = graph.get_node_mut(node_id) {
            node.parent_id = Some(parent_id.clone());
        }
    }
    if let Some(cycle) = graph.find_parent_cycle() {
        return Err(GraphError::CycleDetected(cycle.join(" -> ")));
    }

    Ok(links)
}

fn era_id_for(era_ids: &HashMap<String, i32>, era: Option<&str>) -> Option<i32> {
    era.and_then(|name| era_ids.get(name).copied())
}

async fn ensure_data_set(
    txn: &DatabaseTransaction,
    name: &str,
    now: DateTime<Utc>,
) -> GraphResult<data_sets::Model> {
    if let Some(existing) = data_sets::Entity::find()
        .filter(data_sets::Column::Name.eq(name))
        .one(txn)
        .await?
    {
        return Ok(existing);
    }

    let created = data_sets::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created data set {:?}", name);
    Ok(created)
}

pub(crate) async fn ensure_era(
    txn: &DatabaseTransaction,
    name: &str,
    data_set_id: i32,
    now: DateTime<Utc>,
) -> GraphResult<eras::Model> {
    if let Some(existing) = eras::Entity::find()
        .filter(eras::Column::Name.eq(name))
        .one(txn)
        .await?
    {
        return Ok(existing);
    }

    let created = eras::ActiveModel {
        name: Set(name.to_string()),
        data_set_id: Set(data_set_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!("Created era {:?}", name);
    Ok(created)
}

pub(crate) async fn ensure_default_era(
    txn: &DatabaseTransaction,
    name: &str,
    now: DateTime<Utc>,
) -> GraphResult<eras::Model> {
    let data_set = ensure_data_set(txn, DEFAULT_DATA_SET, now).await?;
    ensure_era(txn, name, data_set.id, now).await
}

async fn upsert_node(
    txn: &DatabaseTransaction,
    node: &Node,
    era_id: Option<i32>,
    sort_order: i32,
    now: DateTime<Utc>,
) -> GraphResult<()> {
    let existing = nodes::Entity::find_by_id(node.id.clone()).one(txn).await?;
    let is_new = existing.is_none();

    let mut model: nodes::ActiveModel = match existing {
        Some(row) => row.into(),
        None => nodes::ActiveModel {
            id: Set(node.id.clone()),
            created_at: Set(now),
            ..Default::default()
        },
    };

    model.node_type = Set(node.kind.as_str().to_string());
    model.label = Set(node.data.label.clone());
    model.description = Set(node.data.description.clone());
    model.masterpieces = Set(serde_json::json!(node.data.masterpieces));
    model.position_x = Set(node.position.x);
    model.position_y = Set(node.position.y);
    model.width = Set(node.size.map(|s| s.width));
    model.height = Set(node.size.map(|s| s.height));
    model.era_id = Set(era_id);
    model.parent_node_id = Set(None);
    model.sort_order = Set(sort_order);
    model.updated_at = Set(now);

    if is_new {
        model.insert(txn).await?;
    } else {
        model.update(txn).await?;
    }
    Ok(())
}

async fn upsert_edge(
    txn: &DatabaseTransaction,
    edge: &Edge,
    era_id: Option<i32>,
    sort_order: i32,
    now: DateTime<Utc>,
) -> GraphResult<()> {
    let existing = edges::Entity::find_by_id(edge.id.clone()).one(txn).await?;
    let is_new = existing.is_none();

    let mut model: edges::ActiveModel = match existing {
        Some(row) => row.into(),
        None => edges::ActiveModel {
            id: Set(edge.id.clone()),
            created_at: Set(now),
            ..Default::default()
        },
    };

    model.label = Set(edge.label.clone());
    model.relation_type = Set(edge.relation.as_str().to_string());
    model.era_id = Set(era_id);
    model.source_node_id = Set(edge.source.clone());
    model.target_node_id = Set(edge.target.clone());
    model.sort_order = Set(sort_order);
    model.updated_at = Set(now);

    if is_new {
        model.insert(txn).await?;
    } else {
        model.update(txn).await?;
    }
    Ok(())
}
