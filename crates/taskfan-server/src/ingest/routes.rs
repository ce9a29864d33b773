use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};
use url::form_urlencoded;
use uuid::Uuid;

use super::pipeline::{IngestError, IngestSummary, Pipeline};
use crate::dispatch::BackendMode;
use crate::error::AppError;
use crate::middleware;
use crate::storage::{FileReference, ObjectStore};

#[derive(Clone)]
pub struct IngestState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn ObjectStore>,
}

impl IngestState {
    pub fn new(pipeline: Pipeline, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store,
        }
    }

    fn mode(&self) -> BackendMode {
        self.pipeline.dispatcher().mode()
    }
}

/// `GET /?f=<path-or-uri>` runs the file through the pipeline.
pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/", get(ingest_file))
        .route("/health", get(crate::health))
        .with_state(state)
        .layer(middleware::tracing_layer())
}

#[tracing::instrument(skip_all, fields(run_id = %Uuid::new_v4(), file = tracing::field::Empty))]
async fn ingest_file(
    State(state): State<IngestState>,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, AppError> {
    let reference = query
        .as_deref()
        .and_then(|query| first_param(query, "f"))
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("parameter f (file) is mandatory".to_string()))?;
    tracing::Span::current().record("file", reference.as_str());

    let pipeline = Arc::clone(&state.pipeline);
    let run = match FileReference::parse(&reference) {
        FileReference::Remote(object) => {
            if state.mode() != BackendMode::Managed {
                return Err(AppError::BadRequest("GCP is not configured".to_string()));
            }
            let data = state.store.fetch(&object).await?;
            detach(async move { pipeline.run(&data[..]).await })
        },
        FileReference::Local(path) => detach(async move { pipeline.run_file(&path).await }),
    };

    run.await??;

    Ok(StatusCode::OK)
}

/// First value of `name`; later repeats are ignored.
fn first_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Run an ingestion on its own task.
///
/// The row loop outlives the request: a client that disconnects mid-file
/// does not stop it. Only the shutdown token does. The outcome is logged
/// here since nobody may be left to receive the response.
fn detach<F>(run: F) -> JoinHandle<Result<IngestSummary, IngestError>>
where
    F: Future<Output = Result<IngestSummary, IngestError>> + Send + 'static,
{
    tokio::spawn(
        async move {
            let result = run.await;
            match &result {
                Ok(summary) => info!(
                    rows_dispatched = summary.rows_dispatched,
                    rows_mismatched = summary.rows_mismatched,
                    "File ingested"
                ),
                Err(e) => error!(error = %e, "File ingestion stopped"),
            }
            result
        }
        .in_current_span(),
    )
}
