use sqlx::PgPool;
use tracing::instrument;

use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

use super::model::{CreateInstructorDto, Instructor, InstructorDetail, UpdateInstructorDto};

const DETAIL_SELECT: &str = r#"
    SELECT i.id, i.user_id, u.first_name, u.last_name, u.email,
           i.bio, i.specialty, i.created_at
    FROM instructors i
    JOIN users u ON u.id = i.user_id
"#;

pub struct InstructorService;

impl InstructorService {
    #[instrument(skip(db))]
    pub async fn list_instructors(db: &PgPool) -> Result<Vec<InstructorDetail>, AppError> {
        let query = format!("{DETAIL_SELECT} ORDER BY u.last_name, u.first_name");
        let instructors = sqlx::query_as::<_, InstructorDetail>(&query)
            .fetch_all(db)
            .await?;

        Ok(instructors)
    }

    #[instrument(skip(db))]
    pub async fn get_instructor(db: &PgPool, id: i32) -> Result<InstructorDetail, AppError> {
        let query = format!("{DETAIL_SELECT} WHERE i.id = $1");
        let instructor = sqlx::query_as::<_, InstructorDetail>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        Ok(instructor)
    }

    /// Creates an instructor profile and promotes the user's role in one
    /// transaction, so a profile never exists for a plain student account.
    #[instrument(skip(db, dto))]
    pub async fn create_instructor(
        db: &PgPool,
        dto: CreateInstructorDto,
    ) -> Result<Instructor, AppError> {
        let mut tx = db.begin().await?;

        let user_role: Option<(String,)> =
            sqlx::query_as("SELECT role FROM users WHERE id = $1 FOR UPDATE")
                .bind(dto.user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((role,)) = user_role else {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        };

        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM instructors WHERE user_id = $1")
                .bind(dto.user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User already has an instructor profile"
            )));
        }

        let instructor = sqlx::query_as::<_, Instructor>(
            "INSERT INTO instructors (user_id, bio, specialty)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, bio, specialty, created_at",
        )
        .bind(dto.user_id)
        .bind(&dto.bio)
        .bind(&dto.specialty)
        .fetch_one(&mut *tx)
        .await?;

        // Admins keep their role; everyone else becomes an instructor.
        if role != UserRole::Admin.as_str() {
            sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
                .bind(UserRole::Instructor.as_str())
                .bind(dto.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(instructor)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_instructor(
        db: &PgPool,
        id: i32,
        caller_id: i32,
        caller_is_admin: bool,
        dto: UpdateInstructorDto,
    ) -> Result<Instructor, AppError> {
        let owner: Option<(i32,)> = sqlx::query_as("SELECT user_id FROM instructors WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;

        let Some((user_id,)) = owner else {
            return Err(AppError::not_found(anyhow::anyhow!("Instructor not found")));
        };

        if !caller_is_admin && user_id != caller_id {
            return Err(AppError::forbidden(
                "Access denied to this instructor profile.",
            ));
        }

        let instructor = sqlx::query_as::<_, Instructor>(
            "UPDATE instructors
             SET bio = COALESCE($1, bio), specialty = COALESCE($2, specialty)
             WHERE id = $3
             RETURNING id, user_id, bio, specialty, created_at",
        )
        .bind(&dto.bio)
        .bind(&dto.specialty)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(instructor)
    }
}
