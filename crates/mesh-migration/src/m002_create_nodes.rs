//! Миграция: создание таблицы mesh_node.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m002_create_nodes"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MeshNode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeshNode::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MeshNode::GroupId).string().not_null())
                    .col(
                        ColumnDef::new(MeshNode::Uuid)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MeshNode::Name)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshNode::Label)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshNode::Sshkey)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshNode::SshPort)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MeshNode::SshPortAlt)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MeshNode::Latitude).double())
                    .col(ColumnDef::new(MeshNode::Longitude).double())
                    .col(
                        ColumnDef::new(MeshNode::Pending)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MeshNode::Active)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MeshNode::Update)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(MeshNode::CreatedOn).string().not_null())
                    .col(ColumnDef::new(MeshNode::UpdatedOn).string().not_null())
                    .col(ColumnDef::new(MeshNode::CheckedOn).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Индекс по group_id для выборки узлов группы
        manager
            .create_index(
                Index::create()
                    .table(MeshNode::Table)
                    .col(MeshNode::GroupId)
                    .name("idx_mesh_node_group_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MeshNode::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MeshNode {
    Table,
    Id,
    GroupId,
    Uuid,
    Name,
    Label,
    Sshkey,
    SshPort,
    SshPortAlt,
    Latitude,
    Longitude,
    Pending,
    Active,
    Update,
    CreatedOn,
    UpdatedOn,
    CheckedOn,
}
