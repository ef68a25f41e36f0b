//! Command-line harvester for the public licensing register sources.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Harvest licensing/registration data from public web sources",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Page through the register name search and write one CSV.
    Register(commands::register::RegisterArgs),
    /// Snapshot the licence tables from the aggregation site.
    Tables(commands::tables::TablesArgs),
    /// Build the firm/licensee/organization tree via the crawling service.
    Firms(commands::firms::FirmsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Register(args) => commands::register::run(args).await,
        Command::Tables(args) => commands::tables::run(args).await,
        Command::Firms(args) => commands::firms::run(args).await,
    }
}
