//! Реестр узлов: регистрация, протокол checkin, машина состояний.

use crate::error::AppError;
use crate::services::{group_service, port_allocator};
use chrono::Utc;
use md5::{Digest, Md5};
use mesh_entities::groups;
use mesh_entities::nodes::{ActiveModel, Column, Entity as NodeEntity, Model, NodeState};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

/// Данные регистрации узла.
pub struct RegisterData {
    pub group: String,
    pub uuid: String,
    pub sshkey: Option<String>,
    pub name: Option<String>,
}

/// Частичное обновление узла: перезаписываются только заданные поля.
///
/// Флаги pending/active напрямую не выставляются: ими управляют
/// approve/enable/disable, а смена sshkey возвращает узел в Pending.
#[derive(Default)]
pub struct PatchData {
    pub name: Option<String>,
    pub sshkey: Option<String>,
    pub label: Option<String>,
    pub group: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub update: Option<bool>,
}

/// Ответ на checkin.
///
/// Для ожидающего узла сериализуется ровно {"pending": true}; остальные
/// поля появляются только у подтверждённого узла. Отпечаток ключа и
/// координаты включаются только при их наличии.
#[derive(Debug, Default, Serialize)]
pub struct CheckinResponse {
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port_alt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_host_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sshkey_md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Нормализовать имя: нижний регистр, разделители схлопываются в "_".
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(", ", "_")
        .replace(',', "_")
        .replace(' ', "_")
}

/// MD5-отпечаток публичного ключа (hex в нижнем регистре).
pub fn sshkey_fingerprint(sshkey: &str) -> String {
    hex::encode(Md5::digest(sshkey.as_bytes()))
}

/// Найти узел по UUID устройства.
pub async fn find_node<C: ConnectionTrait>(db: &C, uuid: &str) -> Result<Option<Model>, AppError> {
    Ok(NodeEntity::find()
        .filter(Column::Uuid.eq(uuid))
        .one(db)
        .await?)
}

/// Найти узел по UUID устройства или вернуть NotFound.
pub async fn lookup_node<C: ConnectionTrait>(db: &C, uuid: &str) -> Result<Model, AppError> {
    find_node(db, uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Узел не найден: {uuid}")))
}

/// Состояние узла; недопустимая пара флагов в БД — нарушение целостности.
fn node_state(node: &Model) -> Result<NodeState, AppError> {
    node.state().ok_or_else(|| {
        AppError::Internal(format!(
            "Недопустимая пара флагов pending/active у узла {}",
            node.uuid
        ))
    })
}

fn apply_state(model: &mut ActiveModel, state: NodeState) {
    let (pending, active) = state.flags();
    model.pending = Set(pending);
    model.active = Set(active);
}

/// Зарегистрировать узел или идемпотентно повторить регистрацию.
///
/// Неизвестный UUID создаёт узел в состоянии Pending; выделение пары
/// портов и вставка строки выполняются в одной транзакции. Повторная
/// регистрация ожидающего узла обновляет только переданные поля и не
/// расходует порты. Регистрация поверх подтверждённого узла отклоняется.
pub async fn register(db: &DatabaseConnection, data: RegisterData) -> Result<Model, AppError> {
    let group = group_service::lookup_group(db, &data.group).await?;

    if let Some(node) = find_node(db, &data.uuid).await? {
        return reregister(db, node, &data, &group).await;
    }

    match create_node(db, &data, &group).await {
        // Проигравший параллельную вставку с тем же UUID наблюдает
        // строку победителя и идёт путём идемпотентной перерегистрации.
        Err(AppError::AlreadyExists(_)) => {
            let node = lookup_node(db, &data.uuid).await?;
            reregister(db, node, &data, &group).await
        }
        other => other,
    }
}

async fn create_node(
    db: &DatabaseConnection,
    data: &RegisterData,
    group: &groups::Model,
) -> Result<Model, AppError> {
    let group_id = group.id.clone();
    let uuid = data.uuid.clone();
    let name = data.name.as_deref().map(normalize_name).unwrap_or_default();
    let sshkey = data.sshkey.clone().unwrap_or_default();

    let node = db
        .transaction::<_, Model, AppError>(|txn| {
            Box::pin(async move {
                let (ssh_port, ssh_port_alt) = port_allocator::next_pair(txn).await?;
                let now = Utc::now().to_rfc3339();

                let model = ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    group_id: Set(group_id),
                    uuid: Set(uuid.clone()),
                    name: Set(name),
                    label: Set(String::new()),
                    sshkey: Set(sshkey),
                    ssh_port: Set(ssh_port),
                    ssh_port_alt: Set(ssh_port_alt),
                    latitude: Set(None),
                    longitude: Set(None),
                    pending: Set(true),
                    active: Set(false),
                    update: Set(false),
                    created_on: Set(now.clone()),
                    updated_on: Set(now.clone()),
                    checked_on: Set(now),
                };

                model.insert(txn).await.map_err(|e| match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        AppError::AlreadyExists(format!("Узел уже существует: {uuid}"))
                    }
                    _ => e.into(),
                })
            })
        })
        .await?;

    tracing::info!(
        "Создан узел {} (порты {}/{})",
        node.uuid,
        node.ssh_port,
        node.ssh_port_alt
    );

    Ok(node)
}

async fn reregister(
    db: &DatabaseConnection,
    node: Model,
    data: &RegisterData,
    group: &groups::Model,
) -> Result<Model, AppError> {
    if node_state(&node)? != NodeState::Pending {
        return Err(AppError::Conflict(format!(
            "Узел уже зарегистрирован: {}",
            node.uuid
        )));
    }

    let mut model: ActiveModel = node.into();
    model.group_id = Set(group.id.clone());
    if let Some(name) = &data.name {
        model.name = Set(normalize_name(name));
    }
    if let Some(sshkey) = &data.sshkey {
        model.sshkey = Set(sshkey.clone());
    }
    model.updated_on = Set(Utc::now().to_rfc3339());

    Ok(model.update(db).await?)
}

/// Обработать checkin узла: обновить checked_on и собрать ответ.
pub async fn checkin(db: &DatabaseConnection, uuid: &str) -> Result<CheckinResponse, AppError> {
    let node = lookup_node(db, uuid).await?;
    let group = group_service::lookup_group_id(db, &node.group_id).await?;

    let mut model: ActiveModel = node.into();
    model.checked_on = Set(Utc::now().to_rfc3339());
    let node = model.update(db).await?;

    let state = node_state(&node)?;

    let mut response = CheckinResponse {
        pending: node.pending,
        ..CheckinResponse::default()
    };

    if state != NodeState::Pending {
        response.active = Some(node.active);
        response.update = Some(node.update);
        response.name = Some(node.name.clone());
        response.ssh_port = Some(node.ssh_port);
        response.ssh_port_alt = Some(node.ssh_port_alt);
        response.ssh_host = Some(group.ssh_host.clone());
        response.ssh_host_port = Some(group.ssh_port);
        response.ssh_user = Some(group.ssh_user.clone());

        // Отпечаток позволяет узлу заметить смену ключа на сервере,
        // сам ключ при checkin не передаётся
        if !node.sshkey.is_empty() {
            response.sshkey_md5 = Some(sshkey_fingerprint(&node.sshkey));
        }

        // Координаты включаются только когда заданы обе
        if let (Some(latitude), Some(longitude)) = (node.latitude, node.longitude) {
            response.latitude = Some(latitude);
            response.longitude = Some(longitude);
        }
    }

    Ok(response)
}

/// Подтвердить ожидающий узел (Pending → Active).
pub async fn approve(db: &DatabaseConnection, uuid: &str) -> Result<Model, AppError> {
    let node = lookup_node(db, uuid).await?;

    if node_state(&node)? != NodeState::Pending {
        return Err(AppError::Conflict(format!(
            "Узел не ожидает подтверждения: {uuid}"
        )));
    }

    set_state(db, node, NodeState::Active).await
}

/// Принудительно включить узел, минуя повторное подтверждение.
pub async fn enable(db: &DatabaseConnection, uuid: &str) -> Result<Model, AppError> {
    let node = lookup_node(db, uuid).await?;
    set_state(db, node, NodeState::Active).await
}

/// Выключить узел. Регистрация и порты сохраняются.
pub async fn disable(db: &DatabaseConnection, uuid: &str) -> Result<Model, AppError> {
    let node = lookup_node(db, uuid).await?;

    let state = match node_state(&node)? {
        NodeState::Pending => NodeState::Pending,
        _ => NodeState::ApprovedInactive,
    };

    set_state(db, node, state).await
}

async fn set_state(
    db: &DatabaseConnection,
    node: Model,
    state: NodeState,
) -> Result<Model, AppError> {
    let mut model: ActiveModel = node.into();
    apply_state(&mut model, state);
    model.updated_on = Set(Utc::now().to_rfc3339());
    Ok(model.update(db).await?)
}

/// Частично обновить узел. Смена sshkey возвращает узел в Pending:
/// новый ключ требует повторного подтверждения администратором.
pub async fn patch(db: &DatabaseConnection, uuid: &str, data: PatchData) -> Result<Model, AppError> {
    let node = lookup_node(db, uuid).await?;
    let mut model: ActiveModel = node.into();

    if let Some(name) = &data.name {
        model.name = Set(normalize_name(name));
    }
    if let Some(label) = &data.label {
        model.label = Set(label.clone());
    }
    if let Some(group_name) = &data.group {
        let group = group_service::lookup_group(db, group_name).await?;
        model.group_id = Set(group.id);
    }
    if let Some(latitude) = data.latitude {
        model.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = data.longitude {
        model.longitude = Set(Some(longitude));
    }
    if let Some(update) = data.update {
        model.update = Set(update);
    }
    if let Some(sshkey) = &data.sshkey {
        model.sshkey = Set(sshkey.clone());
        apply_state(&mut model, NodeState::Pending);
    }

    model.updated_on = Set(Utc::now().to_rfc3339());

    Ok(model.update(db).await?)
}

/// Заменить UUID узла после перепрошивки устройства.
///
/// Существующая запись с новым UUID считается устаревшей повторной
/// регистрацией того же устройства и удаляется, но только пока она
/// ожидает подтверждения; столкновение с подтверждённым узлом —
/// нарушение целостности данных. Группа, порты и координаты узла
/// сохраняются.
pub async fn replace_uuid(
    db: &DatabaseConnection,
    uuid: &str,
    new_uuid: &str,
) -> Result<Model, AppError> {
    let node = lookup_node(db, uuid).await?;
    let new_uuid = new_uuid.to_string();

    if new_uuid.is_empty() {
        return Err(AppError::BadRequest("Новый UUID не может быть пустым".into()));
    }

    let node = db
        .transaction::<_, Model, AppError>(|txn| {
            Box::pin(async move {
                if let Some(other) = find_node(txn, &new_uuid).await? {
                    if other.id != node.id {
                        if node_state(&other)? != NodeState::Pending {
                            return Err(AppError::Conflict(format!(
                                "UUID уже занят подтверждённым узлом: {new_uuid}"
                            )));
                        }
                        let stale: ActiveModel = other.into();
                        stale.delete(txn).await?;
                    }
                }

                let mut model: ActiveModel = node.into();
                model.uuid = Set(new_uuid);
                model.updated_on = Set(Utc::now().to_rfc3339());
                Ok(model.update(txn).await?)
            })
        })
        .await?;

    tracing::info!("UUID узла заменён: {uuid} -> {}", node.uuid);

    Ok(node)
}

/// Удалить узел по UUID.
pub async fn delete_node(db: &DatabaseConnection, uuid: &str) -> Result<(), AppError> {
    let node = lookup_node(db, uuid).await?;
    let model: ActiveModel = node.into();
    model.delete(db).await?;
    Ok(())
}

/// Список всех узлов в порядке создания.
pub async fn list_nodes(db: &DatabaseConnection) -> Result<Vec<Model>, AppError> {
    Ok(NodeEntity::find()
        .order_by_asc(Column::CreatedOn)
        .all(db)
        .await?)
}

/// Публичные ключи активных узлов группы (для генерации authorized_keys
/// на SSH-шлюзе).
pub async fn sshkeys_by_group(
    db: &DatabaseConnection,
    group_name: &str,
) -> Result<Vec<String>, AppError> {
    let group = group_service::lookup_group(db, group_name).await?;
    active_group_keys(db, &group.id).await
}

/// Публичные ключи активных узлов всех групп с данным пользователем
/// SSH-шлюза.
pub async fn sshkeys_by_user(
    db: &DatabaseConnection,
    ssh_user: &str,
) -> Result<Vec<String>, AppError> {
    let groups = groups::Entity::find()
        .filter(groups::Column::SshUser.eq(ssh_user))
        .all(db)
        .await?;

    let mut keys = Vec::new();
    for group in groups {
        keys.extend(active_group_keys(db, &group.id).await?);
    }

    Ok(keys)
}

async fn active_group_keys(db: &DatabaseConnection, group_id: &str) -> Result<Vec<String>, AppError> {
    let nodes = NodeEntity::find()
        .filter(Column::GroupId.eq(group_id))
        .filter(Column::Active.eq(true))
        .all(db)
        .await?;

    Ok(nodes
        .into_iter()
        .map(|n| n.sshkey)
        .filter(|k| !k.is_empty())
        .collect())
}
