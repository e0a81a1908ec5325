use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{change_password, get_user, list_users, update_profile};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", patch(update_profile))
        .route("/me/password", patch(change_password))
        .route("/{id}", get(get_user))
}
