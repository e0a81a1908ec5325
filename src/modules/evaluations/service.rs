use sqlx::PgPool;
use tracing::instrument;

use crate::utils::errors::AppError;

use super::model::{CreateReviewDto, Review, ReviewWithAuthor};

pub struct ReviewService;

impl ReviewService {
    #[instrument(skip(db))]
    pub async fn list_reviews(db: &PgPool, course_id: i32) -> Result<Vec<ReviewWithAuthor>, AppError> {
        let course: Option<(i32,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await?;

        if course.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.id, r.course_id, r.user_id,
                    u.first_name || ' ' || u.last_name AS author_name,
                    r.rating, r.comment, r.created_at
             FROM course_reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.course_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        Ok(reviews)
    }

    /// Creates a review. Only students with a non-cancelled enrollment may
    /// review, and each student reviews a course at most once.
    #[instrument(skip(db, dto))]
    pub async fn create_review(
        db: &PgPool,
        course_id: i32,
        user_id: i32,
        dto: CreateReviewDto,
    ) -> Result<Review, AppError> {
        let course: Option<(i32,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await?;

        if course.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        let enrolled: Option<(i32,)> = sqlx::query_as(
            "SELECT id FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status != 'cancelled'",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(db)
        .await?;

        if enrolled.is_none() {
            return Err(AppError::forbidden(
                "You must be enrolled in this course to review it.",
            ));
        }

        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO course_reviews (course_id, user_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id, course_id, user_id, rating, comment, created_at",
        )
        .bind(course_id)
        .bind(user_id)
        .bind(dto.rating)
        .bind(&dto.comment)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::bad_request(anyhow::anyhow!("You have already reviewed this course"))
            }
            _ => e.into(),
        })?;

        Ok(review)
    }
}
