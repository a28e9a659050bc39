use axum::{routing::post, Router};

use crate::state::AppState;

pub mod fallback;
pub mod gateway;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/suggest-headline", post(handlers::suggest_headline))
        .route("/ai/generate-summary", post(handlers::generate_summary))
        .route("/ai/suggest-keywords", post(handlers::suggest_keywords))
        .route("/ai/improve-content", post(handlers::improve_content))
        .route("/ai/chatbot", post(handlers::chatbot))
        .route("/ai-suggest", post(handlers::suggest_bundle))
}
