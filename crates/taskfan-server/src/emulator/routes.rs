use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use super::Forwarder;
use crate::error::AppError;
use crate::middleware;

/// `POST /` accepts a serialized task-creation request and delivers it.
pub fn router(forwarder: Forwarder) -> Router {
    Router::new()
        .route("/", post(enqueue_task))
        .route("/health", get(crate::health))
        .with_state(forwarder)
        .layer(middleware::tracing_layer())
}

#[tracing::instrument(skip_all, fields(bytes = body.len()))]
async fn enqueue_task(
    State(forwarder): State<Forwarder>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    forwarder.forward(&body).await?;
    Ok(StatusCode::OK)
}
