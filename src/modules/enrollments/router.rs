use axum::Router;
use axum::routing::{get, patch, post};

use crate::state::AppState;

use super::controller::{cancel_enrollment, complete_lesson, get_progress, list_enrollments};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments))
        .route("/{id}/progress", get(get_progress))
        .route("/{id}/lessons/{lesson_id}/complete", post(complete_lesson))
        .route("/{id}/cancel", patch(cancel_enrollment))
}
