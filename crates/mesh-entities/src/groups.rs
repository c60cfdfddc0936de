//! Entity для таблицы mesh_group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mesh_group")]
pub struct Model {
    /// UUID первичного ключа
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Уникальное имя группы (нормализованное, нижний регистр)
    #[sea_orm(unique)]
    pub name: String,

    /// Отображаемая метка
    pub label: String,

    /// Пользователь SSH-шлюза группы
    pub ssh_user: String,

    /// Хост SSH-шлюза группы
    pub ssh_host: String,

    /// Порт SSH-шлюза группы
    pub ssh_port: i32,

    /// Время создания (ISO-8601, UTC)
    pub created_on: String,

    /// Время последнего изменения (ISO-8601, UTC)
    pub updated_on: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
