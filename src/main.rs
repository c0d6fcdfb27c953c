use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::settings::Settings;
use database::{clear_schema, connect};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Plinth service toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file, if one exists.
    let _ = dotenvy::dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings =
        configuration::load_config(&cli.config).context("Failed to load configuration")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Migrate(args) => handle_migrate(args, &settings).await?,
        Commands::ClearSchema => handle_clear_schema(&settings).await?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Bootstrap tooling for PostgreSQL-backed services.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations to the configured database.
    Migrate(MigrateArgs),
    /// Drop and recreate the public schema, erasing all data.
    ClearSchema,
}

#[derive(Parser)]
struct MigrateArgs {
    /// Revision to stop at (defaults to the head of the chain).
    #[arg(long)]
    target: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Connects to the database and advances it along the migration chain.
async fn handle_migrate(args: MigrateArgs, settings: &Settings) -> anyhow::Result<()> {
    let mut migration = settings.database.migration.clone();
    if args.target.is_some() {
        migration.target_revision = args.target;
    }

    // Checked here as well so the failure happens before any connection
    // attempt; the library entry point repeats the check for its callers.
    if migration.script_location.is_none() {
        anyhow::bail!("database.migration.script_location should be specified explicitly");
    }

    let pool = connect(&settings.database).await?;
    let mut conn = pool.acquire().await?;
    database::migrate(&mut conn, &migration).await?;

    Ok(())
}

/// Connects to the database and resets the public schema.
async fn handle_clear_schema(settings: &Settings) -> anyhow::Result<()> {
    let pool = connect(&settings.database).await?;
    clear_schema(&pool).await?;
    tracing::info!("Schema cleared");

    Ok(())
}
