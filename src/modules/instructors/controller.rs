use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateInstructorDto, Instructor, InstructorDetail, UpdateInstructorDto};
use super::service::InstructorService;

/// List instructor profiles
#[utoipa::path(
    get,
    path = "/instructors",
    responses((status = 200, description = "Instructors", body = [InstructorDetail])),
    tag = "Instructors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _user))]
pub async fn list_instructors(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<InstructorDetail>>, AppError> {
    let instructors = InstructorService::list_instructors(&state.db).await?;
    Ok(Json(instructors))
}

/// Fetch a single instructor profile
#[utoipa::path(
    get,
    path = "/instructors/{id}",
    params(("id" = i32, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Instructor", body = InstructorDetail),
        (status = 404, description = "Instructor not found")
    ),
    tag = "Instructors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _user))]
pub async fn get_instructor(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<InstructorDetail>, AppError> {
    let instructor = InstructorService::get_instructor(&state.db, id).await?;
    Ok(Json(instructor))
}

/// Create an instructor profile for a user (admin)
///
/// Promotes the target user to the instructor role.
#[utoipa::path(
    post,
    path = "/instructors",
    request_body = CreateInstructorDto,
    responses(
        (status = 201, description = "Instructor created", body = Instructor),
        (status = 400, description = "User already has an instructor profile"),
        (status = 404, description = "User not found")
    ),
    tag = "Instructors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_instructor(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateInstructorDto>,
) -> Result<(StatusCode, Json<Instructor>), AppError> {
    let instructor = InstructorService::create_instructor(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(instructor)))
}

/// Update an instructor profile (owner or admin)
#[utoipa::path(
    put,
    path = "/instructors/{id}",
    params(("id" = i32, Path, description = "Instructor id")),
    request_body = UpdateInstructorDto,
    responses(
        (status = 200, description = "Instructor updated", body = Instructor),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Instructor not found")
    ),
    tag = "Instructors",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, dto))]
pub async fn update_instructor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(dto): ValidatedJson<UpdateInstructorDto>,
) -> Result<Json<Instructor>, AppError> {
    let caller_id = user.user_id()?;
    let instructor =
        InstructorService::update_instructor(&state.db, id, caller_id, user.is_admin(), dto)
            .await?;
    Ok(Json(instructor))
}
