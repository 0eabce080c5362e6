use anyhow::Result;
use clap::{Parser, Subcommand};
use runeterra_backend::api;
use runeterra_backend::config::RuneterraConfig;
use runeterra_backend::database::Database;
use runeterra_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Runeterra forum backend daemon")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = RuneterraConfig::from_env()?;
    config.paths.ensure_directories()?;
    let database = Database::connect(&config.paths)?;
    let newly_created = database.ensure_migrations()?;
    tracing::info!(
        db_path = ?config.paths.db_path,
        newly_created,
        "database ready"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, database).await,
    }
}
