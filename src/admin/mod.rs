use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin",
            get(handlers::dashboard).post(handlers::create_user),
        )
        .route("/admin/delete-user/:id", post(handlers::delete_user))
}
