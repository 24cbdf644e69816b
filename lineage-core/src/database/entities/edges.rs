use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A relationship between two nodes. `era_id` is the source node's era at
/// the time the edge was written.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "edges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub label: String,
    pub relation_type: String,
    pub era_id: Option<i32>,
    pub source_node_id: String,
    pub target_node_id: String,
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
        belongs_to = "super::nodes::Entity",
        from = "Column::SourceNodeId",
        to = "super::nodes::Column::Id"
    )]
    SourceNode,
    #[sea_orm(
        belongs_to = "super::nodes::Entity",
        from = "Column::TargetNodeId",
        to = "super::nodes::Column::Id"
    )]
    TargetNode,
}

impl Related<super::eras::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Eras.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
