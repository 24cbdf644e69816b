use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A historical period. Names are unique; nodes and edges refer to eras by id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "eras")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub data_set_id: i32,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::data_sets::Entity",
        from = "Column::DataSetId",
        to = "super::data_sets::Column::Id"
    )]
    DataSets,
    #[sea_orm(has_many = "super::nodes::Entity")]
    Nodes,
    #[sea_orm(has_many = "super::edges::Entity")]
    Edges,
}

impl Related<super::data_sets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataSets.def()
    }
}

impl Related<super::nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nodes.def()
    }
}

impl Related<super::edges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Edges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
