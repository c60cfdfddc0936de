//! Entity для таблицы mesh_node и машина состояний узла.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mesh_node")]
pub struct Model {
    /// UUID первичного ключа
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Группа-владелец (mesh_group.id)
    pub group_id: String,

    /// UUID устройства: уникальный, узел идентифицирует себя им сам
    #[sea_orm(unique)]
    pub uuid: String,

    /// Нормализованное имя узла (может быть пустым)
    pub name: String,

    /// Отображаемая метка
    pub label: String,

    /// Публичный SSH-ключ узла (текст; может быть пустым)
    pub sshkey: String,

    /// Основной туннельный порт (уникален среди всех узлов)
    #[sea_orm(unique)]
    pub ssh_port: i32,

    /// Дополнительный туннельный порт (уникален среди всех узлов)
    #[sea_orm(unique)]
    pub ssh_port_alt: i32,

    /// Широта (задаётся администратором)
    pub latitude: Option<f64>,

    /// Долгота (задаётся администратором)
    pub longitude: Option<f64>,

    /// Ожидает подтверждения администратора
    pub pending: bool,

    /// Допущен к туннелю
    pub active: bool,

    /// Для узла запланировано обновление ПО
    pub update: bool,

    /// Время создания (ISO-8601, UTC)
    pub created_on: String,

    /// Время последнего изменения (ISO-8601, UTC)
    pub updated_on: String,

    /// Время последнего checkin (ISO-8601, UTC, не убывает)
    pub checked_on: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Состояние узла: три допустимые комбинации флагов pending/active.
///
/// Комбинация pending && active недопустима и непредставима этим типом;
/// прочитанная из БД, она считается нарушением целостности.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Ожидает подтверждения (новая регистрация или смена ключа)
    Pending,
    /// Подтверждён, но выключен администратором
    ApprovedInactive,
    /// Подтверждён и допущен к туннелю
    Active,
}

impl NodeState {
    /// Восстановить состояние из пары флагов БД.
    pub fn from_flags(pending: bool, active: bool) -> Option<NodeState> {
        match (pending, active) {
            (true, false) => Some(NodeState::Pending),
            (false, false) => Some(NodeState::ApprovedInactive),
            (false, true) => Some(NodeState::Active),
            (true, true) => None,
        }
    }

    /// Пара флагов (pending, active) для записи в БД.
    pub fn flags(self) -> (bool, bool) {
        match self {
            NodeState::Pending => (true, false),
            NodeState::ApprovedInactive => (false, false),
            NodeState::Active => (false, true),
        }
    }
}

impl Model {
    /// Текущее состояние узла; None при недопустимой паре флагов.
    pub fn state(&self) -> Option<NodeState> {
        NodeState::from_flags(self.pending, self.active)
    }
}
