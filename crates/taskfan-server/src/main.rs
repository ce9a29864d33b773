//! Taskfan file handler - ingestion entry point

use anyhow::Result;
use std::sync::Arc;
use taskfan_common::logging::{init_logging, LogConfig};
use taskfan_server::{
    config::Config,
    dispatch,
    ingest::{self, IngestState, Pipeline, TaskBuilder},
    server,
    storage::UnimplementedStore,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("taskfan-filehandler")
        .filter_directives("taskfan_server=debug,tower_http=info")
        .build()
        .merge_env()?;
    init_logging(&log_config)?;

    let config = Config::load()?;
    let dispatcher = dispatch::from_config(&config)?;
    info!(
        mode = %dispatcher.mode(),
        handler_url = %config.queue.handler_url,
        "Queue dispatcher ready"
    );

    let shutdown = CancellationToken::new();
    let pipeline = Pipeline::new(
        TaskBuilder::new(config.queue.handler_url.clone()),
        dispatcher,
        shutdown.child_token(),
    );
    let app = ingest::router(IngestState::new(pipeline, Arc::new(UnimplementedStore)));

    info!("Starting file handler on port {}", config.server.port);
    server::serve(app, &config.server, shutdown).await
}
