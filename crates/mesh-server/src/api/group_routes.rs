//! Маршруты групп.

use crate::api::middleware::AdminUser;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::group_service::{self, CreateGroupData, UpdateGroupData};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mesh_entities::groups;
use serde::Deserialize;

/// Запрос создания группы.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub label: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<i32>,
}

/// Запрос частичного обновления группы.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateGroupRequest {
    pub label: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{name}",
            get(get_group).put(update_group).delete(delete_group),
        )
}

/// GET /api/v1/groups — список всех групп.
async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<groups::Model>>, AppError> {
    let groups = group_service::list_groups(&state.db).await?;
    Ok(Json(groups))
}

/// POST /api/v1/groups — создание группы (требует admin JWT).
async fn create_group(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<groups::Model>), AppError> {
    let group = group_service::create_group(
        &state.db,
        CreateGroupData {
            name: req.name,
            label: req.label,
            ssh_user: req.ssh_user,
            ssh_host: req.ssh_host,
            ssh_port: req.ssh_port,
        },
    )
    .await?;

    tracing::info!("Создана группа: {}", group.name);

    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups/{name} — запись группы.
async fn get_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<groups::Model>, AppError> {
    let group = group_service::lookup_group(&state.db, &name).await?;
    Ok(Json(group))
}

/// PUT /api/v1/groups/{name} — обновление группы (требует admin JWT).
async fn update_group(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(name): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<groups::Model>, AppError> {
    let group = group_service::update_group(
        &state.db,
        &name,
        UpdateGroupData {
            label: req.label,
            ssh_user: req.ssh_user,
            ssh_host: req.ssh_host,
            ssh_port: req.ssh_port,
        },
    )
    .await?;

    Ok(Json(group))
}

/// DELETE /api/v1/groups/{name} — удаление группы (требует admin JWT).
/// Отклоняется, пока на группу ссылаются узлы.
async fn delete_group(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    group_service::delete_group(&state.db, &name).await?;
    tracing::info!("Группа удалена: {name}");
    Ok(StatusCode::NO_CONTENT)
}
