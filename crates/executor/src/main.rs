use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use alert_executor::{
    config::Config,
    dispatch::Dispatcher,
    mapping::FileMappingSource,
    runner::CommandRunner,
    server::Server,
    Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    // Wire up the dispatch pipeline
    let mapping = Arc::new(FileMappingSource::new(&config.executor.mapping_path));
    let runner = CommandRunner::new(Duration::from_secs(config.executor.command_timeout_secs));
    let dispatcher = Dispatcher::new(mapping, runner);

    // Start server
    let server = Server::new(dispatcher);
    info!("Starting server on {}", config.server.addr);
    server.start(&config.server.addr).await?;

    Ok(())
}
