//! Taskfan task queue emulator

use anyhow::Result;
use taskfan_common::logging::{init_logging, LogConfig};
use taskfan_server::{config::Config, emulator, server};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("taskfan-taskqueue")
        .filter_directives("taskfan_server=debug,tower_http=info")
        .build()
        .merge_env()?;
    init_logging(&log_config)?;

    let config = Config::load()?;
    let forwarder = emulator::Forwarder::new(config.queue.forward_timeout())?;

    info!("Starting task queue emulator on port {}", config.server.port);
    server::serve(emulator::router(forwarder), &config.server, CancellationToken::new()).await
}
