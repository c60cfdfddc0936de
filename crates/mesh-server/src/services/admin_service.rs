//! Административный сервис: статистика реестра.

use crate::error::AppError;
use mesh_entities::{groups, nodes};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Статистика реестра узлов.
pub struct Stats {
    pub nodes: u64,
    pub pending: u64,
    pub active: u64,
    pub groups: u64,
}

/// Собрать статистику по узлам и группам.
pub async fn get_stats(db: &DatabaseConnection) -> Result<Stats, AppError> {
    let total = nodes::Entity::find().count(db).await?;
    let pending = nodes::Entity::find()
        .filter(nodes::Column::Pending.eq(true))
        .count(db)
        .await?;
    let active = nodes::Entity::find()
        .filter(nodes::Column::Active.eq(true))
        .count(db)
        .await?;
    let groups = groups::Entity::find().count(db).await?;

    Ok(Stats {
        nodes: total,
        pending,
        active,
        groups,
    })
}
