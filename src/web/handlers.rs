use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::EssenceError;
use crate::web::page::{self, View};
use crate::web::state::AppState;
use crate::web::upload;

pub async fn index() -> Html<String> {
    Html(page::render_page(View::Fresh))
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Run one submission and re-render the page with its outcome.
///
/// Errors never leave partial panels behind: a failed submission renders
/// the notice alone.
pub async fn digest(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let submission = match upload::parse_multipart(multipart).await {
        Ok(s) => s,
        Err(msg) => {
            warn!("Bad upload: {}", msg);
            return (
                StatusCode::BAD_REQUEST,
                Html(page::render_page(View::BadRequest(&msg))),
            );
        }
    };

    match state.pipeline.digest(submission).await {
        Ok(output) => (StatusCode::OK, Html(page::render_page(View::Done(&output)))),
        Err(e) => {
            info!("Submission rejected: {}", e.kind());
            (status_for(&e), Html(page::render_page(View::Failed(&e))))
        }
    }
}

/// HTTP status for a failed submission.
pub fn status_for(err: &EssenceError) -> StatusCode {
    match err {
        EssenceError::EmptyInput | EssenceError::DocumentParse { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EssenceError::MissingCode | EssenceError::Unauthorized => StatusCode::UNAUTHORIZED,
        EssenceError::RemoteCall { .. } | EssenceError::ProviderNotConfigured { .. } => {
            StatusCode::BAD_GATEWAY
        }
        EssenceError::RemoteTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
