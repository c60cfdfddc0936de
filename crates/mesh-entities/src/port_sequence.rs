//! Entity для таблицы port_sequence: общий счётчик туннельных портов.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "port_sequence")]
pub struct Model {
    /// Единственная строка счётчика имеет id = 1
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    /// Следующее невыданное значение порта
    pub next_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
