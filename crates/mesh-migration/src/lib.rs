//! Миграции схемы брокера mesh-сети.

pub use sea_orm_migration::prelude::*;

mod m001_create_groups;
mod m002_create_nodes;
mod m003_create_port_sequence;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_create_groups::Migration),
            Box::new(m002_create_nodes::Migration),
            Box::new(m003_create_port_sequence::Migration),
        ]
    }
}
