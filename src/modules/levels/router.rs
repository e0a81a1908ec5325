use axum::Router;
use axum::routing::{get, put};

use crate::state::AppState;

use super::controller::{create_level, delete_level, list_levels, update_level};

pub fn init_levels_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_levels).post(create_level))
        .route("/{id}", put(update_level).delete(delete_level))
}
