use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    LoginRequest, LoginResponse, LogoutRequest, MessageResponse, RefreshRequest, RefreshResponse,
    RegisterRequestDto,
};
use crate::modules::categories::model::{Category, CreateCategoryDto, UpdateCategoryDto};
use crate::modules::courses::model::{
    Course, CourseDetail, CourseModule, CourseStatus, CreateCourseDto, CreateLessonDto,
    CreateModuleDto, Lesson, ModuleWithLessons, PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::modules::enrollments::model::{
    EnrollDto, Enrollment, EnrollmentDetail, EnrollmentStatus, PaginatedEnrollmentsResponse,
    ProgressResponse,
};
use crate::modules::evaluations::model::{CreateReviewDto, Review, ReviewWithAuthor};
use crate::modules::instructors::model::{
    CreateInstructorDto, Instructor, InstructorDetail, UpdateInstructorDto,
};
use crate::modules::levels::model::{CreateLevelDto, Level, UpdateLevelDto};
use crate::modules::users::model::{
    ChangePasswordDto, PaginatedUsersResponse, UpdateProfileDto, User, UserRole,
};
use crate::utils::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout_user,
        crate::modules::auth::controller::get_me,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::list_course_modules,
        crate::modules::courses::controller::create_module,
        crate::modules::courses::controller::create_lesson,
        crate::modules::courses::controller::request_publish,
        crate::modules::courses::controller::request_unpublish,
        crate::modules::courses::controller::list_pending_publish,
        crate::modules::courses::controller::list_pending_unpublish,
        crate::modules::courses::controller::publish_course,
        crate::modules::courses::controller::unpublish_course,
        crate::modules::categories::controller::list_categories,
        crate::modules::categories::controller::create_category,
        crate::modules::categories::controller::update_category,
        crate::modules::categories::controller::delete_category,
        crate::modules::levels::controller::list_levels,
        crate::modules::levels::controller::create_level,
        crate::modules::levels::controller::update_level,
        crate::modules::levels::controller::delete_level,
        crate::modules::instructors::controller::list_instructors,
        crate::modules::instructors::controller::get_instructor,
        crate::modules::instructors::controller::create_instructor,
        crate::modules::instructors::controller::update_instructor,
        crate::modules::enrollments::controller::enroll_in_course,
        crate::modules::enrollments::controller::list_enrollments,
        crate::modules::enrollments::controller::get_progress,
        crate::modules::enrollments::controller::complete_lesson,
        crate::modules::enrollments::controller::cancel_enrollment,
        crate::modules::evaluations::controller::list_reviews,
        crate::modules::evaluations::controller::create_review,
    ),
    components(
        schemas(
            User,
            UserRole,
            RegisterRequestDto,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            LogoutRequest,
            MessageResponse,
            ErrorResponse,
            UpdateProfileDto,
            ChangePasswordDto,
            PaginatedUsersResponse,
            Course,
            CourseDetail,
            CourseStatus,
            CourseModule,
            Lesson,
            ModuleWithLessons,
            CreateCourseDto,
            UpdateCourseDto,
            CreateModuleDto,
            CreateLessonDto,
            PaginatedCoursesResponse,
            Category,
            CreateCategoryDto,
            UpdateCategoryDto,
            Level,
            CreateLevelDto,
            UpdateLevelDto,
            Instructor,
            InstructorDetail,
            CreateInstructorDto,
            UpdateInstructorDto,
            EnrollDto,
            Enrollment,
            EnrollmentDetail,
            EnrollmentStatus,
            PaginatedEnrollmentsResponse,
            ProgressResponse,
            Review,
            ReviewWithAuthor,
            CreateReviewDto,
            PaginationMeta,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login, and token lifecycle"),
        (name = "Users", description = "Account and profile management"),
        (name = "Courses", description = "Course catalog and content"),
        (name = "Categories", description = "Course categories"),
        (name = "Levels", description = "Course difficulty levels"),
        (name = "Instructors", description = "Instructor profiles"),
        (name = "Enrollments", description = "Enrollment and progress tracking"),
        (name = "Reviews", description = "Course reviews")
    ),
    info(
        title = "EduTech API",
        version = "0.1.0",
        description = "REST API for an online learning platform, built with Axum and PostgreSQL with JWT-based authentication.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
