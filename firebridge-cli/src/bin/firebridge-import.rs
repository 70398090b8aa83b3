use anyhow::Result;
use clap::Parser;
use firebridge_cli::args::ImportCli;
use firebridge_cli::commands::run_import;
use firebridge_cli::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ImportCli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.logging.level, cli.common.progress);

    run_import(&config, cli.common.progress).await?;
    Ok(())
}
