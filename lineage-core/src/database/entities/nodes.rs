use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A person or group node. `id` is the editor's own identifier, so rows are
/// upserted by it rather than by a surrogate key.
///
/// Related entities:
/// - `eras`: the node's era, looked up by name on import
/// - `nodes`: the enclosing group, via `parent_node_id`
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub node_type: String, // 'person', 'group'
    pub label: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub masterpieces: Json,
    pub position_x: f64,
    pub position_y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub era_id: Option<i32>,
    pub parent_node_id: Option<String>,
    /// Position in the editor's node sequence.
    pub sort_order: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::eras::Entity",
        from = "Column::EraId",
        to = "super::eras::Column::Id"
    )]
    Eras,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentNodeId",
        to = "Column::Id"
    )]
    Parent,
}

impl Related<super::eras::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Eras.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn masterpiece_list(&self) -> Vec<String> {
        serde_json::from_value(self.masterpieces.clone()).unwrap_or_default()
    }
}
