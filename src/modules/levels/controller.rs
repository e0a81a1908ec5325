use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateLevelDto, Level, UpdateLevelDto};
use super::service::LevelService;

/// List difficulty levels (public)
#[utoipa::path(
    get,
    path = "/levels",
    responses((status = 200, description = "Levels", body = [Level])),
    tag = "Levels"
)]
#[instrument(skip(state))]
pub async fn list_levels(State(state): State<AppState>) -> Result<Json<Vec<Level>>, AppError> {
    let levels = LevelService::list_levels(&state.db).await?;
    Ok(Json(levels))
}

/// Create a level (admin)
#[utoipa::path(
    post,
    path = "/levels",
    request_body = CreateLevelDto,
    responses(
        (status = 201, description = "Level created", body = Level),
        (status = 403, description = "Admin role required")
    ),
    tag = "Levels",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_level(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateLevelDto>,
) -> Result<(StatusCode, Json<Level>), AppError> {
    let level = LevelService::create_level(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

/// Update a level (admin)
#[utoipa::path(
    put,
    path = "/levels/{id}",
    params(("id" = i32, Path, description = "Level id")),
    request_body = UpdateLevelDto,
    responses(
        (status = 200, description = "Level updated", body = Level),
        (status = 404, description = "Level not found")
    ),
    tag = "Levels",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_level(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    ValidatedJson(dto): ValidatedJson<UpdateLevelDto>,
) -> Result<Json<Level>, AppError> {
    let level = LevelService::update_level(&state.db, id, dto).await?;
    Ok(Json(level))
}

/// Delete a level (admin)
#[utoipa::path(
    delete,
    path = "/levels/{id}",
    params(("id" = i32, Path, description = "Level id")),
    responses(
        (status = 204, description = "Level deleted"),
        (status = 400, description = "Level still referenced by courses"),
        (status = 404, description = "Level not found")
    ),
    tag = "Levels",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_level(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    LevelService::delete_level(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
