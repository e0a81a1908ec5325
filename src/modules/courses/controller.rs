use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::{RequireAdmin, RequireInstructor};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    Course, CourseDetail, CourseFilterParams, CourseModule, CourseStatus, CreateCourseDto,
    CreateLessonDto, CreateModuleDto, Lesson, ModuleWithLessons, PaginatedCoursesResponse,
    UpdateCourseDto,
};
use super::service::CourseService;

/// List courses (public)
#[utoipa::path(
    get,
    path = "/courses",
    params(
        ("title" = Option<String>, Query, description = "Filter by title (partial match)"),
        ("status" = Option<CourseStatus>, Query, description = "Filter by publication status"),
        ("category_id" = Option<i32>, Query, description = "Filter by category"),
        ("level_id" = Option<i32>, Query, description = "Filter by level"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination")
    ),
    responses(
        (status = 200, description = "Paginated courses", body = PaginatedCoursesResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state, filters))]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let courses = CourseService::list_courses(&state.db, filters).await?;
    Ok(Json(courses))
}

/// Get a course by id (public)
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = CourseDetail),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseDetail>, AppError> {
    let course = CourseService::get_course(&state.db, id).await?;
    Ok(Json(course))
}

/// Create a course (instructor or admin)
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Instructor or admin role required")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Update a course (owning instructor or admin)
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the owning instructor"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<i32>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::update_course(&state.db, id, &auth_user, dto).await?;
    Ok(Json(course))
}

/// Delete a course (admin)
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a course's modules with their lessons (public)
#[utoipa::path(
    get,
    path = "/courses/{id}/modules",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Modules with lessons", body = [ModuleWithLessons]),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_course_modules(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ModuleWithLessons>>, AppError> {
    let modules = CourseService::list_modules_with_lessons(&state.db, id).await?;
    Ok(Json(modules))
}

/// Add a module to a course (owning instructor or admin)
#[utoipa::path(
    post,
    path = "/courses/{id}/modules",
    params(("id" = i32, Path, description = "Course id")),
    request_body = CreateModuleDto,
    responses(
        (status = 201, description = "Module created", body = CourseModule),
        (status = 403, description = "Not the owning instructor"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_module(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<i32>,
    ValidatedJson(dto): ValidatedJson<CreateModuleDto>,
) -> Result<(StatusCode, Json<CourseModule>), AppError> {
    let module = CourseService::create_module(&state.db, id, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

/// Request publication of a draft course (owning instructor or admin)
#[utoipa::path(
    post,
    path = "/courses/{id}/request-publish",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course now pending publication", body = Course),
        (status = 400, description = "Course is not a draft"),
        (status = 403, description = "Not the owning instructor"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn request_publish(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<i32>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::request_publish(&state.db, id, &auth_user).await?;
    Ok(Json(course))
}

/// Request unpublication of a published course (owning instructor or admin)
#[utoipa::path(
    post,
    path = "/courses/{id}/request-unpublish",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course now pending unpublication", body = Course),
        (status = 400, description = "Course is not published"),
        (status = 403, description = "Not the owning instructor"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn request_unpublish(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<i32>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::request_unpublish(&state.db, id, &auth_user).await?;
    Ok(Json(course))
}

/// List courses awaiting publication approval (admin)
#[utoipa::path(
    get,
    path = "/courses/pending-publish",
    responses(
        (status = 200, description = "Courses pending publication", body = [CourseDetail]),
        (status = 403, description = "Admin role required")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_pending_publish(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<CourseDetail>>, AppError> {
    let courses = CourseService::list_by_status(&state.db, CourseStatus::PendingPublish).await?;
    Ok(Json(courses))
}

/// List courses awaiting unpublication approval (admin)
#[utoipa::path(
    get,
    path = "/courses/pending-unpublish",
    responses(
        (status = 200, description = "Courses pending unpublication", body = [CourseDetail]),
        (status = 403, description = "Admin role required")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_pending_unpublish(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<CourseDetail>>, AppError> {
    let courses = CourseService::list_by_status(&state.db, CourseStatus::PendingUnpublish).await?;
    Ok(Json(courses))
}

/// Approve a pending publication request (admin)
#[utoipa::path(
    patch,
    path = "/courses/{id}/publish",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course published", body = Course),
        (status = 400, description = "No pending publication request"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn publish_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::publish_course(&state.db, id).await?;
    Ok(Json(course))
}

/// Approve a pending unpublication request (admin)
#[utoipa::path(
    patch,
    path = "/courses/{id}/unpublish",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course back in draft", body = Course),
        (status = 400, description = "No pending unpublication request"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn unpublish_course(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::unpublish_course(&state.db, id).await?;
    Ok(Json(course))
}

/// Add a lesson to a module (owning instructor or admin)
#[utoipa::path(
    post,
    path = "/courses/{id}/modules/{module_id}/lessons",
    params(
        ("id" = i32, Path, description = "Course id"),
        ("module_id" = i32, Path, description = "Module id")
    ),
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Module does not belong to the course"),
        (status = 403, description = "Not the owning instructor")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_lesson(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path((id, module_id)): Path<(i32, i32)>,
    ValidatedJson(dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = CourseService::create_lesson(&state.db, id, module_id, &auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}
