use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataSets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataSets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataSets::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(DataSets::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Eras::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Eras::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Eras::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Eras::DataSetId).integer().not_null())
                    .col(ColumnDef::new(Eras::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_eras_data_set_id")
                            .from(Eras::Table, Eras::DataSetId)
                            .to(DataSets::Table, DataSets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Nodes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Nodes::NodeType).string().not_null())
                    .col(ColumnDef::new(Nodes::Label).string().not_null())
                    .col(ColumnDef::new(Nodes::Description).text())
                    .col(ColumnDef::new(Nodes::Masterpieces).json().not_null())
                    .col(ColumnDef::new(Nodes::PositionX).double().not_null())
                    .col(ColumnDef::new(Nodes::PositionY).double().not_null())
                    .col(ColumnDef::new(Nodes::Width).double())
                    .col(ColumnDef::new(Nodes::Height).double())
                    .col(ColumnDef::new(Nodes::EraId).integer())
                    .col(ColumnDef::new(Nodes::ParentNodeId).string())
                    .col(ColumnDef::new(Nodes::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(Nodes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Nodes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_era_id")
                            .from(Nodes::Table, Nodes::EraId)
                            .to(Eras::Table, Eras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_parent_node_id")
                            .from(Nodes::Table, Nodes::ParentNodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Edges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Edges::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Edges::Label).string().not_null())
                    .col(ColumnDef::new(Edges::RelationType).string().not_null())
                    .col(ColumnDef::new(Edges::EraId).integer())
                    .col(ColumnDef::new(Edges::SourceNodeId).string().not_null())
                    .col(ColumnDef::new(Edges::TargetNodeId).string().not_null())
                    .col(ColumnDef::new(Edges::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(Edges::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Edges::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_era_id")
                            .from(Edges::Table, Edges::EraId)
                            .to(Eras::Table, Eras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_source_node_id")
                            .from(Edges::Table, Edges::SourceNodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_target_node_id")
                            .from(Edges::Table, Edges::TargetNodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nodes_era_id")
                    .table(Nodes::Table)
                    .col(Nodes::EraId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nodes_parent_node_id")
                    .table(Nodes::Table)
                    .col(Nodes::ParentNodeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Edges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Eras::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DataSets::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum DataSets {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Eras {
    Table,
    Id,
    Name,
    DataSetId,
    CreatedAt,
}

#[derive(Iden)]
enum Nodes {
    Table,
    Id,
    NodeType,
    Label,
    Description,
    Masterpieces,
    PositionX,
    PositionY,
    Width,
    Height,
    EraId,
    ParentNodeId,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Edges {
    Table,
    Id,
    Label,
    RelationType,
    EraId,
    SourceNodeId,
    TargetNodeId,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}
