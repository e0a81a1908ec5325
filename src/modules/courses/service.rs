use sqlx::PgPool;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    Course, CourseDetail, CourseFilterParams, CourseModule, CourseStatus, CreateCourseDto,
    CreateLessonDto, CreateModuleDto, Lesson, ModuleWithLessons, PaginatedCoursesResponse,
    UpdateCourseDto,
};

const COURSE_COLUMNS: &str = "id, title, description, price, workload_hours,
        category_id, level_id, instructor_id, status, created_at, updated_at";

const DETAIL_SELECT: &str = r#"SELECT
        c.id, c.title, c.description, c.price, c.workload_hours,
        c.category_id, cat.name AS category,
        c.level_id, l.name AS level,
        c.instructor_id, u.first_name || ' ' || u.last_name AS instructor,
        c.status, c.created_at, c.updated_at
       FROM courses c
       JOIN categories cat ON cat.id = c.category_id
       JOIN levels l ON l.id = c.level_id
       JOIN users u ON u.id = c.instructor_id"#;

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, filters))]
    pub async fn list_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE true");
        let mut text_params: Vec<String> = Vec::new();
        let mut int_params: Vec<i32> = Vec::new();
        let mut next_param = 1;

        // Text params bind before int params, so text filters come first in
        // the clause.
        if let Some(title) = &filters.title {
            text_params.push(format!("%{}%", title));
            where_clause.push_str(&format!(" AND c.title ILIKE ${next_param}"));
            next_param += 1;
        }
        if let Some(status) = filters.status {
            text_params.push(status.as_str().to_string());
            where_clause.push_str(&format!(" AND c.status = ${next_param}"));
            next_param += 1;
        }
        if let Some(category_id) = filters.category_id {
            int_params.push(category_id);
            where_clause.push_str(&format!(" AND c.category_id = ${next_param}"));
            next_param += 1;
        }
        if let Some(level_id) = filters.level_id {
            int_params.push(level_id);
            where_clause.push_str(&format!(" AND c.level_id = ${next_param}"));
        }

        let count_query = format!("SELECT COUNT(*) FROM courses c{where_clause}");
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &text_params {
            count_sql = count_sql.bind(param);
        }
        for param in &int_params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "{DETAIL_SELECT}{where_clause}
             ORDER BY c.created_at DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut data_sql = sqlx::query_as::<_, CourseDetail>(&data_query);
        for param in &text_params {
            data_sql = data_sql.bind(param);
        }
        for param in &int_params {
            data_sql = data_sql.bind(param);
        }
        let courses = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, course_id: i32) -> Result<CourseDetail, AppError> {
        sqlx::query_as::<_, CourseDetail>(&format!("{DETAIL_SELECT} WHERE c.id = $1"))
            .bind(course_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    #[instrument(skip(db, dto, auth_user))]
    pub async fn create_course(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        // Instructors always own what they create; only admins may assign a
        // different owner.
        let instructor_id = if auth_user.is_admin() {
            dto.instructor_id.unwrap_or(auth_user.user_id()?)
        } else {
            auth_user.user_id()?
        };

        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (title, description, price, workload_hours,
                                  category_id, level_id, instructor_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.price)
        .bind(dto.workload_hours)
        .bind(dto.category_id)
        .bind(dto.level_id)
        .bind(instructor_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "Unknown category, level, or instructor"
                ));
            }
            AppError::from(e)
        })?;

        Ok(course)
    }

    #[instrument(skip(db, dto, auth_user))]
    pub async fn update_course(
        db: &PgPool,
        course_id: i32,
        auth_user: &AuthUser,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        Self::ensure_course_owner(db, course_id, auth_user).await?;

        let course = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                workload_hours = COALESCE($5, workload_hours),
                category_id = COALESCE($6, category_id),
                level_id = COALESCE($7, level_id),
                updated_at = now()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.price)
        .bind(dto.workload_hours)
        .bind(dto.category_id)
        .bind(dto.level_id)
        .fetch_one(db)
        .await?;

        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, course_id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_modules_with_lessons(
        db: &PgPool,
        course_id: i32,
    ) -> Result<Vec<ModuleWithLessons>, AppError> {
        // 404 on unknown course, as opposed to an empty module list.
        sqlx::query_scalar::<_, i32>("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

        let modules = sqlx::query_as::<_, CourseModule>(
            "SELECT id, course_id, title, position
             FROM course_modules WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        let lessons = sqlx::query_as::<_, Lesson>(
            "SELECT l.id, l.module_id, l.title, l.content_url, l.duration_minutes, l.position
             FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE m.course_id = $1
             ORDER BY l.position",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        let result = modules
            .into_iter()
            .map(|module| {
                let lessons = lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .cloned()
                    .collect();
                ModuleWithLessons { module, lessons }
            })
            .collect();

        Ok(result)
    }

    #[instrument(skip(db, dto, auth_user))]
    pub async fn create_module(
        db: &PgPool,
        course_id: i32,
        auth_user: &AuthUser,
        dto: CreateModuleDto,
    ) -> Result<CourseModule, AppError> {
        Self::ensure_course_owner(db, course_id, auth_user).await?;

        let module = sqlx::query_as::<_, CourseModule>(
            "INSERT INTO course_modules (course_id, title, position)
             VALUES ($1, $2, $3)
             RETURNING id, course_id, title, position",
        )
        .bind(course_id)
        .bind(&dto.title)
        .bind(dto.position)
        .fetch_one(db)
        .await?;

        Ok(module)
    }

    #[instrument(skip(db, dto, auth_user))]
    pub async fn create_lesson(
        db: &PgPool,
        course_id: i32,
        module_id: i32,
        auth_user: &AuthUser,
        dto: CreateLessonDto,
    ) -> Result<Lesson, AppError> {
        Self::ensure_course_owner(db, course_id, auth_user).await?;

        let module_course =
            sqlx::query_scalar::<_, i32>("SELECT course_id FROM course_modules WHERE id = $1")
                .bind(module_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Module not found")))?;

        if module_course != course_id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Module does not belong to this course"
            )));
        }

        let lesson = sqlx::query_as::<_, Lesson>(
            "INSERT INTO lessons (module_id, title, content_url, duration_minutes, position)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, module_id, title, content_url, duration_minutes, position",
        )
        .bind(module_id)
        .bind(&dto.title)
        .bind(&dto.content_url)
        .bind(dto.duration_minutes)
        .bind(dto.position)
        .fetch_one(db)
        .await?;

        Ok(lesson)
    }

    /// Instructor asks for the course to be published. Draft courses only;
    /// an admin approves via [`Self::publish_course`].
    #[instrument(skip(db, auth_user))]
    pub async fn request_publish(
        db: &PgPool,
        course_id: i32,
        auth_user: &AuthUser,
    ) -> Result<Course, AppError> {
        let course = Self::ensure_course_owner(db, course_id, auth_user).await?;
        Self::transition(
            db,
            &course,
            CourseStatus::PendingPublish,
            "Only draft courses can request publication",
        )
        .await
    }

    /// Instructor asks for a published course to be taken down.
    #[instrument(skip(db, auth_user))]
    pub async fn request_unpublish(
        db: &PgPool,
        course_id: i32,
        auth_user: &AuthUser,
    ) -> Result<Course, AppError> {
        let course = Self::ensure_course_owner(db, course_id, auth_user).await?;
        Self::transition(
            db,
            &course,
            CourseStatus::PendingUnpublish,
            "Only published courses can request unpublication",
        )
        .await
    }

    /// Admin listing of courses sitting in a publication-workflow state.
    #[instrument(skip(db))]
    pub async fn list_by_status(
        db: &PgPool,
        status: CourseStatus,
    ) -> Result<Vec<CourseDetail>, AppError> {
        let courses = sqlx::query_as::<_, CourseDetail>(&format!(
            "{DETAIL_SELECT} WHERE c.status = $1 ORDER BY c.updated_at"
        ))
        .bind(status.as_str())
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    /// Admin approves a pending publication request.
    #[instrument(skip(db))]
    pub async fn publish_course(db: &PgPool, course_id: i32) -> Result<Course, AppError> {
        let course = Self::fetch_course(db, course_id).await?;
        Self::transition(
            db,
            &course,
            CourseStatus::Published,
            "Course has no pending publication request",
        )
        .await
    }

    /// Admin approves a pending unpublication request, returning the course
    /// to draft.
    #[instrument(skip(db))]
    pub async fn unpublish_course(db: &PgPool, course_id: i32) -> Result<Course, AppError> {
        let course = Self::fetch_course(db, course_id).await?;
        Self::transition(
            db,
            &course,
            CourseStatus::Draft,
            "Course has no pending unpublication request",
        )
        .await
    }

    /// Moves the course along the publication workflow, rejecting moves the
    /// transition table does not allow.
    async fn transition(
        db: &PgPool,
        course: &Course,
        next: CourseStatus,
        rejection: &str,
    ) -> Result<Course, AppError> {
        let current = CourseStatus::parse(&course.status).ok_or_else(|| {
            AppError::internal(anyhow::anyhow!(
                "Unknown status '{}' on course {}",
                course.status,
                course.id
            ))
        })?;

        if !current.can_transition_to(next) {
            return Err(AppError::bad_request(anyhow::anyhow!("{rejection}")));
        }

        let course = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course.id)
        .bind(next.as_str())
        .fetch_one(db)
        .await?;

        Ok(course)
    }

    async fn fetch_course(db: &PgPool, course_id: i32) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    /// Fetches the course and checks write access: admins always, the owning
    /// instructor otherwise.
    pub async fn ensure_course_owner(
        db: &PgPool,
        course_id: i32,
        auth_user: &AuthUser,
    ) -> Result<Course, AppError> {
        let course = Self::fetch_course(db, course_id).await?;

        if !auth_user.is_admin() && course.instructor_id != auth_user.user_id()? {
            return Err(AppError::forbidden(
                "You are not the instructor of this course.",
            ));
        }

        Ok(course)
    }
}
