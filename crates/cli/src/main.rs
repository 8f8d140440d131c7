use clap::Parser;

use salesbook_cli::config::log_config;
use salesbook_cli::{App, AppConfig, Cli, commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    salesbook_observability::logging::init(&log_config(&cli.global));

    let config = AppConfig::from_args(&cli.global)?;
    let app = App::open(&config).await?;

    let mut stdout = std::io::stdout().lock();
    commands::run(&app, cli.command, config.refresh_interval, &mut stdout).await
}
