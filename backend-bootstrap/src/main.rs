use anyhow::Result;
use clap::Parser;
use tracing::info;

use backend_bootstrap::{init_logging, run_command, AppContext, Cli, StoreBackend};
use backend_infrastructure::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await?,
        None => AppConfig::load().await?,
    };
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir.clone();
    }

    let _log_guard = init_logging(config.log_dir.as_deref(), cli.log_json)?;
    info!(command = ?cli.command(), bind_addr = %config.bind_addr, "starting faultline");

    let backend = if cli.memory {
        StoreBackend::Memory
    } else {
        StoreBackend::Clickhouse
    };
    let context = AppContext::new(&config, backend).await?;
    run_command(context, cli.command()).await
}
