//! Lectora CLI - Structured analysis of government programs.

use clap::Parser;
use lectora_cli::{AppConfig, Cli};
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> lectora_cli::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    Cli::parse();

    let mut config = AppConfig::from_env()?;

    let log_file = lectora_cli::init_logging(&config.logs_dir)?;
    info!("Log file: {}", log_file.display());
    info!("Programs directory: {}", config.programs_dir.display());

    let summary = lectora_cli::analyze(&mut config).await?;
    summary.log();
    println!("{}", summary);

    Ok(())
}
