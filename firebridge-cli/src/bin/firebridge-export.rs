use anyhow::Result;
use clap::Parser;
use firebridge_cli::args::ExportCli;
use firebridge_cli::commands::run_export;
use firebridge_cli::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ExportCli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.logging.level, cli.common.progress);

    run_export(&config, cli.common.progress).await?;
    Ok(())
}
