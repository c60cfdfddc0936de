//! Административные маршруты: статистика, правка узлов, выгрузка ключей.

use crate::api::middleware::AdminUser;
use crate::api::AppState;
use crate::error::AppError;
use crate::services::registry_service::{self, PatchData};
use crate::services::admin_service;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use mesh_entities::nodes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub nodes: u64,
    pub pending: u64,
    pub active: u64,
    pub groups: u64,
}

/// Административная правка узла: все изменяемые поля.
#[derive(Debug, Deserialize, Default)]
pub struct AdminPatchRequest {
    pub name: Option<String>,
    pub sshkey: Option<String>,
    pub label: Option<String>,
    pub group: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub update: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SshkeysQuery {
    /// "group" (по умолчанию) или "user"
    pub by: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/nodes/{uuid}", patch(patch_node))
        .route("/sshkeys/{name}", get(get_sshkeys))
}

/// GET /api/v1/admin/stats — статистика реестра (требует admin JWT).
async fn get_stats(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = admin_service::get_stats(&state.db).await?;

    Ok(Json(StatsResponse {
        nodes: stats.nodes,
        pending: stats.pending,
        active: stats.active,
        groups: stats.groups,
    }))
}

/// PATCH /api/v1/admin/nodes/{uuid} — правка узла администратором.
/// Смена sshkey и здесь возвращает узел на подтверждение.
async fn patch_node(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(uuid): Path<String>,
    Json(req): Json<AdminPatchRequest>,
) -> Result<Json<nodes::Model>, AppError> {
    let node = registry_service::patch(
        &state.db,
        &uuid,
        PatchData {
            name: req.name,
            sshkey: req.sshkey,
            label: req.label,
            group: req.group,
            latitude: req.latitude,
            longitude: req.longitude,
            update: req.update,
        },
    )
    .await?;

    Ok(Json(node))
}

/// GET /api/v1/admin/sshkeys/{name}?by=group|user — ключи активных узлов
/// группы или всех групп пользователя SSH-шлюза (требует admin JWT).
async fn get_sshkeys(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Path(name): Path<String>,
    Query(query): Query<SshkeysQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let keys = match query.by.as_deref() {
        None | Some("group") => registry_service::sshkeys_by_group(&state.db, &name).await?,
        Some("user") => registry_service::sshkeys_by_user(&state.db, &name).await?,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Неизвестное значение by: {other}"
            )))
        }
    };

    Ok(Json(keys))
}
