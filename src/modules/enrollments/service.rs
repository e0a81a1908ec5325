use sqlx::PgPool;
use tracing::instrument;

use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    EnrollDto, Enrollment, EnrollmentDetail, EnrollmentFilterParams, EnrollmentStatus,
    PaginatedEnrollmentsResponse, ProgressResponse,
};

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, status, enrolled_at, completed_at";

const DETAIL_SELECT: &str = r#"
    SELECT e.id, e.student_id, u.first_name || ' ' || u.last_name AS student_name,
           e.course_id, c.title AS course_title, e.status, e.enrolled_at, e.completed_at
    FROM enrollments e
    JOIN users u ON u.id = e.student_id
    JOIN courses c ON c.id = e.course_id
"#;

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls a student in a course. Students enroll themselves; an
    /// instructor or admin enrolls the student named in the body. A student
    /// may hold at most one non-cancelled enrollment per course.
    #[instrument(skip(db, dto))]
    pub async fn enroll(
        db: &PgPool,
        caller_id: i32,
        caller_role: UserRole,
        course_id: i32,
        dto: EnrollDto,
    ) -> Result<Enrollment, AppError> {
        let student_id = Self::resolve_student(caller_id, caller_role, dto.student_id)?;

        let course: Option<(i32,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await?;

        if course.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        if student_id != caller_id {
            let student: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
                .bind(student_id)
                .fetch_optional(db)
                .await?;

            if student.is_none() {
                return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
            }
        }

        let existing: Option<(i32,)> = sqlx::query_as(
            "SELECT id FROM enrollments
             WHERE student_id = $1 AND course_id = $2 AND status != 'cancelled'",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(db)
        .await?;

        if existing.is_some() {
            return Err(AppError::bad_request(anyhow::anyhow!("Already enrolled in this course")));
        }

        let query = format!(
            "INSERT INTO enrollments (student_id, course_id, status)
             VALUES ($1, $2, 'active')
             RETURNING {ENROLLMENT_COLUMNS}"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(student_id)
            .bind(course_id)
            .fetch_one(db)
            .await?;

        Ok(enrollment)
    }

    /// Lists enrollments scoped to the caller: students see their own,
    /// instructors see enrollments in courses they teach, admins see all.
    #[instrument(skip(db, params))]
    pub async fn list_enrollments(
        db: &PgPool,
        caller_id: i32,
        caller_role: UserRole,
        params: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut int_params: Vec<i32> = Vec::new();
        let mut param_idx = 1;

        match caller_role {
            UserRole::Student => {
                conditions.push(format!("e.student_id = ${param_idx}"));
                int_params.push(caller_id);
                param_idx += 1;
            }
            UserRole::Instructor => {
                conditions.push(format!("c.instructor_id = ${param_idx}"));
                int_params.push(caller_id);
                param_idx += 1;
            }
            UserRole::Admin => {}
        }

        if let Some(course_id) = params.course_id {
            conditions.push(format!("e.course_id = ${param_idx}"));
            int_params.push(course_id);
            param_idx += 1;
        }

        let status_filter = params.status.map(|s| {
            let clause = format!("e.status = ${param_idx}");
            conditions.push(clause);
            s.as_str()
        });

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!(
            "SELECT COUNT(*) FROM enrollments e
             JOIN users u ON u.id = e.student_id
             JOIN courses c ON c.id = e.course_id {where_clause}"
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for p in &int_params {
            count_query = count_query.bind(p);
        }
        if let Some(status) = status_filter {
            count_query = count_query.bind(status);
        }
        let total = count_query.fetch_one(db).await?;

        let limit = params.pagination.limit();
        let offset = params.pagination.offset();
        let data_sql = format!(
            "{DETAIL_SELECT} {where_clause} ORDER BY e.enrolled_at DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut data_query = sqlx::query_as::<_, EnrollmentDetail>(&data_sql);
        for p in &int_params {
            data_query = data_query.bind(p);
        }
        if let Some(status) = status_filter {
            data_query = data_query.bind(status);
        }
        let data = data_query.fetch_all(db).await?;

        Ok(PaginatedEnrollmentsResponse {
            data,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get_progress(
        db: &PgPool,
        enrollment_id: i32,
        caller_id: i32,
        caller_role: UserRole,
    ) -> Result<ProgressResponse, AppError> {
        let enrollment =
            Self::fetch_enrollment_for(db, enrollment_id, caller_id, caller_role).await?;

        let total_lessons: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE m.course_id = $1",
        )
        .bind(enrollment.course_id)
        .fetch_one(db)
        .await?;

        let completed_lessons: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = $1")
                .bind(enrollment_id)
                .fetch_one(db)
                .await?;

        let percent_complete = if total_lessons == 0 {
            0.0
        } else {
            completed_lessons as f64 / total_lessons as f64 * 100.0
        };

        Ok(ProgressResponse {
            enrollment_id: enrollment.id,
            course_id: enrollment.course_id,
            total_lessons,
            completed_lessons,
            percent_complete,
            status: enrollment.status,
        })
    }

    /// Records a lesson as completed for an enrollment. Completing the last
    /// remaining lesson flips the enrollment to `completed`.
    #[instrument(skip(db))]
    pub async fn complete_lesson(
        db: &PgPool,
        enrollment_id: i32,
        lesson_id: i32,
        caller_id: i32,
    ) -> Result<ProgressResponse, AppError> {
        let enrollment = Self::fetch_enrollment(db, enrollment_id).await?;

        if enrollment.student_id != caller_id {
            return Err(AppError::forbidden("Access denied to this enrollment."));
        }
        if enrollment.status != EnrollmentStatus::Active.as_str() {
            return Err(AppError::bad_request(anyhow::anyhow!("Enrollment is not active")));
        }

        let lesson_in_course: Option<(i32,)> = sqlx::query_as(
            "SELECT l.id FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE l.id = $1 AND m.course_id = $2",
        )
        .bind(lesson_id)
        .bind(enrollment.course_id)
        .fetch_optional(db)
        .await?;

        if lesson_in_course.is_none() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Lesson does not belong to the enrolled course"
            )));
        }

        // Re-completing a lesson is a no-op.
        sqlx::query(
            "INSERT INTO lesson_progress (enrollment_id, lesson_id)
             VALUES ($1, $2)
             ON CONFLICT (enrollment_id, lesson_id) DO NOTHING",
        )
        .bind(enrollment_id)
        .bind(lesson_id)
        .execute(db)
        .await?;

        let total_lessons: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons l
             JOIN course_modules m ON m.id = l.module_id
             WHERE m.course_id = $1",
        )
        .bind(enrollment.course_id)
        .fetch_one(db)
        .await?;

        let completed_lessons: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = $1")
                .bind(enrollment_id)
                .fetch_one(db)
                .await?;

        let mut status = enrollment.status.clone();
        if total_lessons > 0 && completed_lessons >= total_lessons {
            sqlx::query(
                "UPDATE enrollments SET status = 'completed', completed_at = NOW()
                 WHERE id = $1 AND status = 'active'",
            )
            .bind(enrollment_id)
            .execute(db)
            .await?;
            status = EnrollmentStatus::Completed.as_str().to_string();
        }

        let percent_complete = if total_lessons == 0 {
            0.0
        } else {
            completed_lessons as f64 / total_lessons as f64 * 100.0
        };

        Ok(ProgressResponse {
            enrollment_id,
            course_id: enrollment.course_id,
            total_lessons,
            completed_lessons,
            percent_complete,
            status,
        })
    }

    #[instrument(skip(db))]
    pub async fn cancel_enrollment(
        db: &PgPool,
        enrollment_id: i32,
        caller_id: i32,
        caller_is_admin: bool,
    ) -> Result<Enrollment, AppError> {
        let enrollment = Self::fetch_enrollment(db, enrollment_id).await?;

        if !caller_is_admin && enrollment.student_id != caller_id {
            return Err(AppError::forbidden("Access denied to this enrollment."));
        }
        if enrollment.status != EnrollmentStatus::Active.as_str() {
            return Err(AppError::bad_request(anyhow::anyhow!("Enrollment is not active")));
        }

        let query = format!(
            "UPDATE enrollments SET status = 'cancelled' WHERE id = $1
             RETURNING {ENROLLMENT_COLUMNS}"
        );
        let enrollment = sqlx::query_as::<_, Enrollment>(&query)
            .bind(enrollment_id)
            .fetch_one(db)
            .await?;

        Ok(enrollment)
    }

    /// Picks the student being enrolled: callers with the student role always
    /// enroll themselves, anything in the body ignored; instructors and
    /// admins must name the student.
    fn resolve_student(
        caller_id: i32,
        caller_role: UserRole,
        named: Option<i32>,
    ) -> Result<i32, AppError> {
        match caller_role {
            UserRole::Student => Ok(caller_id),
            UserRole::Instructor | UserRole::Admin => named.ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "student_id is required when enrolling on behalf of a student"
                ))
            }),
        }
    }

    async fn fetch_enrollment(db: &PgPool, id: i32) -> Result<Enrollment, AppError> {
        let query = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))
    }

    /// Fetches an enrollment the caller is allowed to inspect: the enrolled
    /// student, the course's instructor, or an admin.
    async fn fetch_enrollment_for(
        db: &PgPool,
        id: i32,
        caller_id: i32,
        caller_role: UserRole,
    ) -> Result<Enrollment, AppError> {
        let enrollment = Self::fetch_enrollment(db, id).await?;

        let allowed = match caller_role {
            UserRole::Admin => true,
            UserRole::Student => enrollment.student_id == caller_id,
            UserRole::Instructor => {
                let instructor_id: Option<i32> =
                    sqlx::query_scalar("SELECT instructor_id FROM courses WHERE id = $1")
                        .bind(enrollment.course_id)
                        .fetch_optional(db)
                        .await?;
                instructor_id == Some(caller_id)
            }
        };

        if !allowed {
            return Err(AppError::forbidden("Access denied to this enrollment."));
        }

        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_student_always_enrolls_self() {
        assert_eq!(
            EnrollmentService::resolve_student(5, UserRole::Student, None).unwrap(),
            5
        );
        // A student naming someone else still enrolls themselves.
        assert_eq!(
            EnrollmentService::resolve_student(5, UserRole::Student, Some(9)).unwrap(),
            5
        );
    }

    #[test]
    fn test_instructor_and_admin_enroll_named_student() {
        assert_eq!(
            EnrollmentService::resolve_student(2, UserRole::Instructor, Some(9)).unwrap(),
            9
        );
        assert_eq!(
            EnrollmentService::resolve_student(1, UserRole::Admin, Some(9)).unwrap(),
            9
        );
    }

    #[test]
    fn test_on_behalf_enrollment_requires_student_id() {
        for role in [UserRole::Instructor, UserRole::Admin] {
            let err = EnrollmentService::resolve_student(2, role, None).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }
}
