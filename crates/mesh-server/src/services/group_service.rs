//! Сервис групп: CRUD с нормализованными уникальными именами.

use crate::error::AppError;
use crate::services::registry_service::normalize_name;
use chrono::Utc;
use mesh_entities::groups::{ActiveModel, Column, Entity as GroupEntity, Model};
use mesh_entities::nodes;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
};
use uuid::Uuid;

/// Данные создания группы.
pub struct CreateGroupData {
    pub name: String,
    pub label: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<i32>,
}

/// Частичное обновление группы: перезаписываются только заданные поля.
#[derive(Default)]
pub struct UpdateGroupData {
    pub label: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<i32>,
}

/// Найти группу по имени (имя нормализуется перед поиском).
pub async fn find_group<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, AppError> {
    Ok(GroupEntity::find()
        .filter(Column::Name.eq(normalize_name(name)))
        .one(db)
        .await?)
}

/// Найти группу по имени или вернуть NotFound.
pub async fn lookup_group<C: ConnectionTrait>(db: &C, name: &str) -> Result<Model, AppError> {
    find_group(db, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Группа не найдена: {name}")))
}

/// Найти группу по внутреннему идентификатору или вернуть NotFound.
pub async fn lookup_group_id<C: ConnectionTrait>(db: &C, id: &str) -> Result<Model, AppError> {
    GroupEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Группа не найдена: {id}")))
}

/// Создать группу. Столкновение нормализованных имён отклоняется.
pub async fn create_group(
    db: &DatabaseConnection,
    data: CreateGroupData,
) -> Result<Model, AppError> {
    let name = normalize_name(&data.name);
    if name.is_empty() {
        return Err(AppError::BadRequest("Имя группы не может быть пустым".into()));
    }

    if find_group(db, &name).await?.is_some() {
        return Err(AppError::AlreadyExists(format!(
            "Группа уже существует: {name}"
        )));
    }

    let now = Utc::now().to_rfc3339();
    let model = ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name.clone()),
        label: Set(data.label.unwrap_or_default()),
        ssh_user: Set(data.ssh_user.unwrap_or_default()),
        ssh_host: Set(data.ssh_host.unwrap_or_default()),
        ssh_port: Set(data.ssh_port.unwrap_or(22)),
        created_on: Set(now.clone()),
        updated_on: Set(now),
    };

    // Параллельное создание с тем же именем проигрывает на уникальном индексе
    model.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::AlreadyExists(format!("Группа уже существует: {name}"))
        }
        _ => e.into(),
    })
}

/// Частично обновить группу: только переданные поля.
pub async fn update_group(
    db: &DatabaseConnection,
    name: &str,
    data: UpdateGroupData,
) -> Result<Model, AppError> {
    let group = lookup_group(db, name).await?;
    let mut model: ActiveModel = group.into();

    if let Some(label) = data.label {
        model.label = Set(label);
    }
    if let Some(ssh_user) = data.ssh_user {
        model.ssh_user = Set(ssh_user);
    }
    if let Some(ssh_host) = data.ssh_host {
        model.ssh_host = Set(ssh_host);
    }
    if let Some(ssh_port) = data.ssh_port {
        model.ssh_port = Set(ssh_port);
    }
    model.updated_on = Set(Utc::now().to_rfc3339());

    Ok(model.update(db).await?)
}

/// Удалить группу. Пока на группу ссылаются узлы, удаление отклоняется.
pub async fn delete_group(db: &DatabaseConnection, name: &str) -> Result<(), AppError> {
    let group = lookup_group(db, name).await?;

    let referencing = nodes::Entity::find()
        .filter(nodes::Column::GroupId.eq(group.id.clone()))
        .count(db)
        .await?;

    if referencing > 0 {
        return Err(AppError::Conflict(format!(
            "Группа {} используется узлами: {referencing}",
            group.name
        )));
    }

    let model: ActiveModel = group.into();
    model.delete(db).await?;
    Ok(())
}

/// Список всех групп по имени.
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<Model>, AppError> {
    Ok(GroupEntity::find()
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}
