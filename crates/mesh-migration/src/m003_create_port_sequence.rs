//! Миграция: создание и засев счётчика туннельных портов.

use sea_orm_migration::prelude::*;

/// Первое выдаваемое значение порта.
const PORT_SEQUENCE_START: i64 = 2200;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m003_create_port_sequence"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PortSequence::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortSequence::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PortSequence::NextValue)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Единственная строка счётчика: порты выдаются начиная с 2200
        let seed = Query::insert()
            .into_table(PortSequence::Table)
            .columns([PortSequence::Id, PortSequence::NextValue])
            .values_panic([1.into(), PORT_SEQUENCE_START.into()])
            .to_owned();

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PortSequence::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PortSequence {
    Table,
    Id,
    NextValue,
}
