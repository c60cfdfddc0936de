//! Миграция: создание таблицы mesh_group.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_create_groups"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MeshGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeshGroup::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MeshGroup::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MeshGroup::Label)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshGroup::SshUser)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshGroup::SshHost)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(MeshGroup::SshPort)
                            .integer()
                            .not_null()
                            .default(22),
                    )
                    .col(ColumnDef::new(MeshGroup::CreatedOn).string().not_null())
                    .col(ColumnDef::new(MeshGroup::UpdatedOn).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MeshGroup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MeshGroup {
    Table,
    Id,
    Name,
    Label,
    SshUser,
    SshHost,
    SshPort,
    CreatedOn,
    UpdatedOn,
}
