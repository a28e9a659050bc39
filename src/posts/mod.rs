use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod uploads;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/create-post",
            get(handlers::create_post_form).post(handlers::create_post),
        )
        .route(
            "/edit-post/:id",
            get(handlers::edit_post_form).post(handlers::edit_post),
        )
        .route("/delete-post/:id", post(handlers::delete_post))
        .route("/post/:id", get(handlers::view_post))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}
