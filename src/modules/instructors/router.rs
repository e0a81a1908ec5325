use axum::Router;
use axum::routing::get;

use crate::state::AppState;

use super::controller::{create_instructor, get_instructor, list_instructors, update_instructor};

pub fn init_instructors_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_instructors).post(create_instructor))
        .route("/{id}", get(get_instructor).put(update_instructor))
}
