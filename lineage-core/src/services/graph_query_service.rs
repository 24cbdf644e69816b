use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::reconcile_service::ensure_default_era;
use super::{edge_from_model, node_from_model};
use crate::database::entities::{edges, eras, nodes};
use crate::errors::{GraphError, GraphResult};
use crate::graph::{GraphState, NodeKind, Position};

/// A node row together with what the editor shows next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeWithRelations {
    pub node: nodes::Model,
    pub era: Option<eras::Model>,
    pub parent: Option<nodes::Model>,
    pub children: Vec<nodes::Model>,
}

/// Payload for creating a single person node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub label: String,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub masterpieces: Vec<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub parent_node: Option<String>,
}

pub struct GraphQueryService {
    db: DatabaseConnection,
}

impl GraphQueryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn fetch_eras(&self) -> GraphResult<Vec<eras::Model>> {
        let eras = eras::Entity::find()
            .order_by_asc(eras::Column::Id)
            .all(&self.db)
            .await?;
        Ok(eras)
    }

    /// Nodes in editor order, optionally limited to one era, each with its
    /// era, parent and immediate children.
    pub async fn fetch_nodes(&self, era_id: Option<i32>) -> GraphResult<Vec<NodeWithRelations>> {
        let mut query = nodes::Entity::find();
        if let Some(era_id) = era_id {
            query = query.filter(nodes::Column::EraId.eq(era_id));
        }
        let selected = query
            .order_by_asc(nodes::Column::SortOrder)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;

        // Parents and children may lie outside the era filter.
        let all_nodes = nodes::Entity::find()
            .order_by_asc(nodes::Column::SortOrder)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        let by_id: HashMap<&str, &nodes::Model> =
            all_nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let eras: HashMap<i32, eras::Model> = self
            .fetch_eras()
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let result = selected
            .into_iter()
            .map(|node| {
                let parent = node
                    .parent_node_id
                    .as_deref()
                    .and_then(|id| by_id.get(id))
                    .map(|parent| (*parent).clone());
                let children = all_nodes
                    .iter()
                    .filter(|child| child.parent_node_id.as_deref() == Some(node.id.as_str()))
                    .cloned()
                    .collect();
                let era = node.era_id.and_then(|id| eras.get(&id)).cloned();
                NodeWithRelations {
                    node,
                    era,
                    parent,
                    children,
                }
            })
            .collect::<Vec<_>>();

        debug!("Fetched {} nodes (era filter: {:?})", result.len(), era_id);
        Ok(result)
    }

    /// Insert one person node, creating its era if needed. It goes after every
    /// existing node in editor order.
    pub async fn create_node(&self, payload: NewNode) -> GraphResult<nodes::Model> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        if let Some(parent_id) = &payload.parent_node {
            let parent = nodes::Entity::find_by_id(parent_id.clone())
                .one(&txn)
                .await?
                .ok_or_else(|| GraphError::NodeNotFound(parent_id.clone()))?;
            if parent.node_type != NodeKind::Group.as_str() {
                return Err(GraphError::InvalidParent {
                    node: payload.label.clone(),
                    parent: parent_id.clone(),
                    reason: format!("parent is a {} node, not a group", parent.node_type),
                });
            }
        }

        let era_id = match payload.era.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(ensure_default_era(&txn, name, now).await?.id),
            _ => None,
        };
        let sort_order = nodes::Entity::find().count(&txn).await? as i32;

        let created = nodes::ActiveModel {
            id: Set(format!("node-{}", Uuid::new_v4())),
            node_type: Set(NodeKind::Person.as_str().to_string()),
            label: Set(payload.label),
            description: Set(payload.description),
            masterpieces: Set(serde_json::json!(payload.masterpieces)),
            position_x: Set(payload.position.x),
            position_y: Set(payload.position.y),
            width: Set(None),
            height: Set(None),
            era_id: Set(era_id),
            parent_node_id: Set(payload.parent_node),
            sort_order: Set(sort_order),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        debug!("Created node {} ({})", created.id, created.label);
        Ok(created)
    }

    /// The whole stored graph as the store's model, in editor order.
    pub async fn load_state(&self) -> GraphResult<GraphState> {
        let era_names: HashMap<i32, String> = self
            .fetch_eras()
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();
        let era_name = |id: Option<i32>| id.and_then(|id| era_names.get(&id).cloned());

        let nodes = nodes::Entity::find()
            .order_by_asc(nodes::Column::SortOrder)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?
            .iter()
            .map(|row| node_from_model(row, era_name(row.era_id)))
            .collect();

        let edges = edges::Entity::find()
            .order_by_asc(edges::Column::SortOrder)
            .order_by_asc(edges::Column::Id)
            .all(&self.db)
            .await?
            .iter()
            .map(|row| edge_from_model(row, era_name(row.era_id)))
            .collect();

        Ok(GraphState::new(nodes, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::graph::{Edge, Node, NodeData, RelationType, Size};
    use crate::services::ReconcileService;

    async fn seeded_db() -> DatabaseConnection {
        let db = setup_test_db().await;
        let nodes = vec![
            Node::person(
                "leonardo",
                Position::new(40.0, 40.0),
                NodeData::new("Leonardo da Vinci").with_era("Renaissance"),
            )
            .with_parent("florence"),
            Node::person(
                "michelangelo",
                Position::new(240.0, 40.0),
                NodeData::new("Michelangelo").with_era("Renaissance"),
            )
            .with_parent("florence"),
            Node::group(
                "florence",
                Position::new(-40.0, -40.0),
                Size::new(380.0, 130.0),
                NodeData::new("Florence").with_description(""),
            ),
            Node::person(
                "caravaggio",
                Position::new(600.0, 0.0),
                NodeData::new("Caravaggio").with_era("Baroque"),
            ),
        ];
        let edges = vec![Edge::new("e1", "leonardo", "michelangelo", RelationType::Rival)];
        ReconcileService::new(db.clone())
            .reconcile(&nodes, &edges)
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_fetch_eras() {
        let service = GraphQueryService::new(seeded_db().await);
        let names: Vec<String> = service
            .fetch_eras()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Renaissance", "Baroque"]);
    }

    #[tokio::test]
    async fn test_fetch_nodes_with_relations() {
        let service = GraphQueryService::new(seeded_db().await);
        let all = service.fetch_nodes(None).await.unwrap();
        assert_eq!(all.len(), 4);

        let florence = all.iter().find(|n| n.node.id == "florence").unwrap();
        assert_eq!(florence.children.len(), 2);
        assert!(florence.parent.is_none());

        let leonardo = all.iter().find(|n| n.node.id == "leonardo").unwrap();
        assert_eq!(leonardo.parent.as_ref().unwrap().id, "florence");
        assert_eq!(leonardo.era.as_ref().unwrap().name, "Renaissance");
    }

    #[tokio::test]
    async fn test_fetch_nodes_by_era() {
        let service = GraphQueryService::new(seeded_db().await);
        let baroque = service
            .fetch_eras()
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.name == "Baroque")
            .unwrap();

        let nodes = service.fetch_nodes(Some(baroque.id)).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node.id, "caravaggio");
    }

    #[tokio::test]
    async fn test_create_node() {
        let service = GraphQueryService::new(seeded_db().await);
        let created = service
            .create_node(NewNode {
                label: "Rembrandt".to_string(),
                era: Some("Dutch Golden Age".to_string()),
                masterpieces: vec!["The Night Watch".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(created.id.starts_with("node-"));
        assert_eq!(created.sort_order, 4);
        assert_eq!(created.masterpiece_list(), vec!["The Night Watch"]);
        assert_eq!(service.fetch_eras().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_node_with_bad_parent() {
        let service = GraphQueryService::new(seeded_db().await);

        let err = service
            .create_node(NewNode {
                label: "X".to_string(),
                parent_node: Some("ghost".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .create_node(NewNode {
                label: "X".to_string(),
                parent_node: Some("caravaggio".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParent { .. }));
    }

    #[tokio::test]
    async fn test_load_state_keeps_order() {
        let service = GraphQueryService::new(seeded_db().await);
        let state = service.load_state().await.unwrap();

        let ids: Vec<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["leonardo", "michelangelo", "florence", "caravaggio"]);
        assert_eq!(state.nodes[0].data.era.as_deref(), Some("Renaissance"));
        assert_eq!(state.nodes[2].size, Some(Size::new(380.0, 130.0)));
        assert_eq!(state.edges[0].relation, RelationType::Rival);
        assert_eq!(state.edges[0].era.as_deref(), Some("Renaissance"));
        assert!(state.verify_graph_integrity().is_ok());
    }
}
