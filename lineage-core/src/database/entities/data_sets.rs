use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Named collection the eras belong to. Seeding always works against the
/// default set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_sets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::eras::Entity")]
    Eras,
}

impl Related<super::eras::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Eras.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
