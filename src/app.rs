use std::net::SocketAddr;

use axum::Router;
use sha2::{Digest, Sha512};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::Key, Expiry, MemoryStore, SessionManagerLayer};

use crate::{admin, ai, auth, posts, state::AppState};

pub fn build_app(state: AppState) -> Router {
    // Sessions last one browser session, live in process memory, and are
    // signed with a key derived from the configured secret.
    let key = Key::from(Sha512::digest(state.config.session_secret.as_bytes()).as_slice());
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnSessionEnd)
        .with_signed(key);

    Router::new()
        .merge(auth::router())
        .merge(posts::router())
        .merge(ai::router())
        .merge(admin::router())
        .with_state(state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
