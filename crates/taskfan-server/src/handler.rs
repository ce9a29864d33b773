//! Echo task handler
//!
//! A minimal downstream target for local runs: logs each delivered task body
//! and sends it straight back.

use axum::{
    body::Bytes,
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::middleware;

pub fn router() -> Router {
    Router::new()
        .route("/", post(echo))
        .route("/health", get(crate::health))
        .layer(middleware::tracing_layer())
}

async fn echo(body: Bytes) -> Bytes {
    info!(body = %String::from_utf8_lossy(&body), "Task received");
    body
}
