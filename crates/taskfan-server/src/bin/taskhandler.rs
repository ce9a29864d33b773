//! Taskfan echo task handler

use anyhow::Result;
use taskfan_common::logging::{init_logging, LogConfig};
use taskfan_server::{config::Config, handler, server};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("taskfan-taskhandler")
        .filter_directives("taskfan_server=info,tower_http=info")
        .build()
        .merge_env()?;
    init_logging(&log_config)?;

    let config = Config::load()?;

    info!("Starting task handler on port {}", config.server.port);
    server::serve(handler::router(), &config.server, CancellationToken::new()).await
}
