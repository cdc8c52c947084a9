//! # Outreach CRM Main Entry Point

use anyhow::Context;
use clap::{Parser, Subcommand};
use outreach_crm::{
    config::{AppConfig, ConfigLoader},
    db,
    offline_cache::run_gateway,
    seeds::seed_demo_user,
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "outreach-crm", version, about = "Outreach CRM API and offline gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations, seed the demo account and serve the API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Run the offline cache gateway in front of the configured upstream
    Gateway,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    match config.redacted_json() {
        Ok(redacted) => tracing::info!(profile = %config.profile, config = %redacted, "Configuration loaded"),
        Err(err) => tracing::warn!(error = %err, "Could not render configuration"),
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let db = db::init_pool(&config).await?;
            db::run_migrations(&db).await?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Command::Gateway => run_gateway(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;

    if seed_demo_user(&db, &config).await? {
        tracing::info!("Demo account created");
    }

    run_server(config, db).await
}
