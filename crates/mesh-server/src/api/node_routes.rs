//! Маршруты узлов: регистрация, checkin, управление состоянием.

use crate::api::middleware::{AdminUser, ApiDevice};
use crate::api::AppState;
use crate::error::AppError;
use crate::services::registry_service::{self, CheckinResponse, PatchData, RegisterData};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mesh_entities::nodes;
use serde::{Deserialize, Serialize};

// ── Типы запросов/ответов ────────────────────────────────────────────────────

/// Запрос регистрации узла.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub group: String,
    pub uuid: String,
    pub sshkey: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
}

/// Запрос частичного обновления узла (устройство или администратор).
#[derive(Debug, Deserialize, Default)]
pub struct PatchRequest {
    pub name: Option<String>,
    pub sshkey: Option<String>,
}

/// Запрос замены UUID после перепрошивки устройства.
#[derive(Debug, Deserialize)]
pub struct ReplaceUuidRequest {
    pub new_uuid: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/nodes", get(list_nodes).post(register))
        .route(
            "/nodes/{uuid}",
            get(get_node).patch(patch_node).delete(delete_node),
        )
        .route("/nodes/{uuid}/checkin", post(checkin))
        .route("/nodes/{uuid}/approve", post(approve))
        .route("/nodes/{uuid}/enable", post(enable))
        .route("/nodes/{uuid}/disable", post(disable))
        .route("/nodes/{uuid}/replace-uuid", post(replace_uuid))
}

// ── Обработчики ──────────────────────────────────────────────────────────────

/// GET /api/v1/nodes — список всех узлов.
async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<nodes::Model>>, AppError> {
    let nodes = registry_service::list_nodes(&state.db).await?;
    Ok(Json(nodes))
}

/// POST /api/v1/nodes — регистрация узла (требует MESH-APIKEY).
async fn register(
    State(state): State<AppState>,
    _device: ApiDevice,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if req.uuid.is_empty() {
        return Err(AppError::BadRequest("uuid обязателен".into()));
    }
    if req.group.is_empty() {
        return Err(AppError::BadRequest("group обязательна".into()));
    }

    let node = registry_service::register(
        &state.db,
        RegisterData {
            group: req.group,
            uuid: req.uuid,
            sshkey: req.sshkey,
            name: req.name,
        },
    )
    .await?;

    tracing::info!("Регистрация узла: {}", node.uuid);

    Ok((StatusCode::CREATED, Json(RegisterResponse { id: node.id })))
}

/// GET /api/v1/nodes/{uuid} — запись узла.
async fn get_node(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<nodes::Model>, AppError> {
    let node = registry_service::lookup_node(&state.db, &uuid).await?;
    Ok(Json(node))
}

/// PATCH /api/v1/nodes/{uuid} — обновление имени или ключа.
/// Смена ключа возвращает узел на подтверждение.
async fn patch_node(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(req): Json<PatchRequest>,
) -> Result<Json<nodes::Model>, AppError> {
    let node = registry_service::patch(
        &state.db,
        &uuid,
        PatchData {
            name: req.name,
            sshkey: req.sshkey,
            ..PatchData::default()
        },
    )
    .await?;

    Ok(Json(node))
}

/// DELETE /api/v1/nodes/{uuid} — удаление узла (требует admin JWT).
async fn delete_node(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(uuid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry_service::delete_node(&state.db, &uuid).await?;
    tracing::info!("Узел удалён: {uuid}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/nodes/{uuid}/checkin — heartbeat узла (требует MESH-APIKEY).
async fn checkin(
    State(state): State<AppState>,
    _device: ApiDevice,
    Path(uuid): Path<String>,
) -> Result<Json<CheckinResponse>, AppError> {
    let response = registry_service::checkin(&state.db, &uuid).await?;
    tracing::debug!("Checkin узла: {uuid}");
    Ok(Json(response))
}

/// POST /api/v1/nodes/{uuid}/approve — подтверждение узла (требует admin JWT).
async fn approve(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(uuid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry_service::approve(&state.db, &uuid).await?;
    tracing::info!("Узел {uuid} подтверждён администратором {}", claims.username);
    Ok(StatusCode::CREATED)
}

/// POST /api/v1/nodes/{uuid}/enable — включение узла (требует admin JWT).
async fn enable(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(uuid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry_service::enable(&state.db, &uuid).await?;
    tracing::info!("Узел включён: {uuid}");
    Ok(StatusCode::CREATED)
}

/// POST /api/v1/nodes/{uuid}/disable — выключение узла (требует admin JWT).
async fn disable(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(uuid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry_service::disable(&state.db, &uuid).await?;
    tracing::info!("Узел выключен: {uuid}");
    Ok(StatusCode::CREATED)
}

/// POST /api/v1/nodes/{uuid}/replace-uuid — замена UUID (требует admin JWT).
async fn replace_uuid(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(uuid): Path<String>,
    Json(req): Json<ReplaceUuidRequest>,
) -> Result<Json<nodes::Model>, AppError> {
    let node = registry_service::replace_uuid(&state.db, &uuid, &req.new_uuid).await?;
    Ok(Json(node))
}
