use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    EnrollDto, Enrollment, EnrollmentFilterParams, PaginatedEnrollmentsResponse, ProgressResponse,
};
use super::service::EnrollmentService;

/// Enroll a student in a course
///
/// Students enroll themselves and the body may be omitted; instructors and
/// admins enroll the student named in the body.
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    params(("id" = i32, Path, description = "Course id")),
    request_body = EnrollDto,
    responses(
        (status = 201, description = "Enrollment created", body = Enrollment),
        (status = 400, description = "Already enrolled, or missing student_id"),
        (status = 404, description = "Course or student not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, body))]
pub async fn enroll_in_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i32>,
    body: Option<Json<EnrollDto>>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let caller_id = user.user_id()?;
    let dto = body.map(|Json(dto)| dto).unwrap_or_default();
    let enrollment =
        EnrollmentService::enroll(&state.db, caller_id, user.role(), course_id, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// List enrollments visible to the caller
///
/// Students see their own enrollments, instructors see enrollments in their
/// courses, admins see everything.
#[utoipa::path(
    get,
    path = "/enrollments",
    params(
        ("course_id" = Option<i32>, Query, description = "Filter by course"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses((status = 200, description = "Enrollments", body = PaginatedEnrollmentsResponse)),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, params))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let caller_id = user.user_id()?;
    let response =
        EnrollmentService::list_enrollments(&state.db, caller_id, user.role(), params).await?;
    Ok(Json(response))
}

/// Fetch completion progress for an enrollment
#[utoipa::path(
    get,
    path = "/enrollments/{id}/progress",
    params(("id" = i32, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Progress", body = ProgressResponse),
        (status = 403, description = "Not the student, instructor, or an admin"),
        (status = 404, description = "Enrollment not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ProgressResponse>, AppError> {
    let caller_id = user.user_id()?;
    let progress =
        EnrollmentService::get_progress(&state.db, id, caller_id, user.role()).await?;
    Ok(Json(progress))
}

/// Mark a lesson completed for an enrollment
#[utoipa::path(
    post,
    path = "/enrollments/{id}/lessons/{lesson_id}/complete",
    params(
        ("id" = i32, Path, description = "Enrollment id"),
        ("lesson_id" = i32, Path, description = "Lesson id")
    ),
    responses(
        (status = 200, description = "Updated progress", body = ProgressResponse),
        (status = 400, description = "Lesson not in course or enrollment inactive"),
        (status = 404, description = "Enrollment not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, lesson_id)): Path<(i32, i32)>,
) -> Result<Json<ProgressResponse>, AppError> {
    let caller_id = user.user_id()?;
    let progress =
        EnrollmentService::complete_lesson(&state.db, id, lesson_id, caller_id).await?;
    Ok(Json(progress))
}

/// Cancel an enrollment (owner or admin)
#[utoipa::path(
    patch,
    path = "/enrollments/{id}/cancel",
    params(("id" = i32, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment cancelled", body = Enrollment),
        (status = 400, description = "Enrollment is not active"),
        (status = 404, description = "Enrollment not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn cancel_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Enrollment>, AppError> {
    let caller_id = user.user_id()?;
    let enrollment =
        EnrollmentService::cancel_enrollment(&state.db, id, caller_id, user.is_admin()).await?;
    Ok(Json(enrollment))
}
