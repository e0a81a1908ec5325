use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::modules::enrollments::controller::enroll_in_course;
use crate::modules::evaluations::router::init_course_reviews_router;
use crate::state::AppState;

use super::controller::{
    create_course, create_lesson, create_module, delete_course, get_course, list_course_modules,
    list_courses, list_pending_publish, list_pending_unpublish, publish_course, request_publish,
    request_unpublish, unpublish_course, update_course,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/pending-publish", get(list_pending_publish))
        .route("/pending-unpublish", get(list_pending_unpublish))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/modules", get(list_course_modules).post(create_module))
        .route("/{id}/modules/{module_id}/lessons", post(create_lesson))
        .route("/{id}/request-publish", post(request_publish))
        .route("/{id}/request-unpublish", post(request_unpublish))
        .route("/{id}/publish", patch(publish_course))
        .route("/{id}/unpublish", patch(unpublish_course))
        .route("/{id}/enroll", post(enroll_in_course))
        .nest("/{id}/reviews", init_course_reviews_router())
}
