use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateReviewDto, Review, ReviewWithAuthor};
use super::service::ReviewService;

/// List reviews for a course (public)
#[utoipa::path(
    get,
    path = "/courses/{id}/reviews",
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Reviews", body = [ReviewWithAuthor]),
        (status = 404, description = "Course not found")
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<ReviewWithAuthor>>, AppError> {
    let reviews = ReviewService::list_reviews(&state.db, course_id).await?;
    Ok(Json(reviews))
}

/// Review a course the caller is enrolled in
#[utoipa::path(
    post,
    path = "/courses/{id}/reviews",
    params(("id" = i32, Path, description = "Course id")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Already reviewed"),
        (status = 403, description = "Not enrolled in this course"),
        (status = 404, description = "Course not found")
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, dto))]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i32>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let user_id = user.user_id()?;
    let review = ReviewService::create_review(&state.db, course_id, user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
