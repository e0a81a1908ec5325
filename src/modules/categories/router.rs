use axum::Router;
use axum::routing::{get, put};

use crate::state::AppState;

use super::controller::{create_category, delete_category, list_categories, update_category};

pub fn init_categories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
}
