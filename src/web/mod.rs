//! The single-page web tool.
//!
//! `GET /` serves the form, `POST /digest` runs one submission and answers
//! with the same page carrying either both result panels or one notice.
//! Each request is independent; the only shared state is the immutable
//! [`DigestPipeline`].

pub mod handlers;
pub mod page;
pub mod state;
pub mod upload;

use crate::digest::DigestPipeline;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Default upload limit: 32 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Build the router for `pipeline`.
pub fn router(pipeline: DigestPipeline, body_limit: usize) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(handlers::index))
        .route("/digest", post(handlers::digest))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the tool on `addr` until Ctrl-C.
pub async fn serve(
    addr: SocketAddr,
    pipeline: DigestPipeline,
    body_limit: usize,
) -> std::io::Result<()> {
    let app = router(pipeline, body_limit);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
