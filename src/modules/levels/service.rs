use sqlx::PgPool;
use tracing::instrument;

use crate::utils::errors::AppError;

use super::model::{CreateLevelDto, Level, UpdateLevelDto};

pub struct LevelService;

impl LevelService {
    #[instrument(skip(db))]
    pub async fn list_levels(db: &PgPool) -> Result<Vec<Level>, AppError> {
        let levels = sqlx::query_as::<_, Level>("SELECT id, name FROM levels ORDER BY id")
            .fetch_all(db)
            .await?;

        Ok(levels)
    }

    #[instrument(skip(db, dto))]
    pub async fn create_level(db: &PgPool, dto: CreateLevelDto) -> Result<Level, AppError> {
        let level =
            sqlx::query_as::<_, Level>("INSERT INTO levels (name) VALUES ($1) RETURNING id, name")
                .bind(&dto.name)
                .fetch_one(db)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                        AppError::bad_request(anyhow::anyhow!("A level with this name already exists"))
                    }
                    _ => e.into(),
                })?;

        Ok(level)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_level(
        db: &PgPool,
        id: i32,
        dto: UpdateLevelDto,
    ) -> Result<Level, AppError> {
        let level =
            sqlx::query_as::<_, Level>("UPDATE levels SET name = $1 WHERE id = $2 RETURNING id, name")
                .bind(&dto.name)
                .bind(id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Level not found")))?;

        Ok(level)
    }

    #[instrument(skip(db))]
    pub async fn delete_level(db: &PgPool, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM levels WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::bad_request(anyhow::anyhow!("Level is still referenced by courses"))
                }
                _ => e.into(),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Level not found")));
        }

        Ok(())
    }
}
