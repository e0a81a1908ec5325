use axum::Router;
use axum::routing::get;

use crate::state::AppState;

use super::controller::{create_review, list_reviews};

/// Nested under `/courses/{id}/reviews`, so handlers pull the course id from
/// the parent capture.
pub fn init_course_reviews_router() -> Router<AppState> {
    Router::new().route("/", get(list_reviews).post(create_review))
}
