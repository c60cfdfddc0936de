//! Выделение туннельных портов из общего счётчика port_sequence.

use crate::error::AppError;
use mesh_entities::port_sequence::{Column, Entity as PortSequenceEntity};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// Идентификатор единственной строки счётчика.
const SEQUENCE_ROW_ID: i32 = 1;

/// Выдать пару уникальных портов для нового узла.
///
/// Счётчик продвигается одним атомарным UPDATE; параллельные вызовы,
/// в том числе из разных экземпляров сервера, не могут получить одно
/// и то же значение. Вызов выполняется в транзакции регистрации:
/// откат транзакции не расходует порты.
pub async fn next_pair<C: ConnectionTrait>(txn: &C) -> Result<(i32, i32), AppError> {
    let advanced = PortSequenceEntity::update_many()
        .col_expr(Column::NextValue, Expr::col(Column::NextValue).add(2))
        .filter(Column::Id.eq(SEQUENCE_ROW_ID))
        .exec(txn)
        .await?;

    if advanced.rows_affected != 1 {
        return Err(AppError::Allocation(
            "Счётчик портов не инициализирован".into(),
        ));
    }

    let row = PortSequenceEntity::find_by_id(SEQUENCE_ROW_ID)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::Allocation("Счётчик портов недоступен после продвижения".into()))?;

    let port = (row.next_value - 2) as i32;
    let port_alt = (row.next_value - 1) as i32;

    Ok((port, port_alt))
}
