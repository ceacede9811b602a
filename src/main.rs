use cashflow_ledger::{
    config::{
        database::{self, create_connection, create_tables},
        reference::{ReferenceConfig, default_reference_config, load_reference_config},
        server,
    },
    core::seed,
    errors::Result,
    web::{self, AppState},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cashflow-ledger", about = "Cash-flow ledger web service.")]
struct Cli {
    /// Database URL (falls back to a local SQLite file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default).
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8000
        #[arg(long, env = "BIND_ADDR")]
        bind: Option<String>,
    },
    /// Seed statuses, types, categories and subcategories.
    Seed {
        /// Remove all reference data first (refused while records exist)
        #[arg(long)]
        reset: bool,
        /// Reference TOML file (default: the bundled reference data)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Add default subcategories to categories that have none.
    BackfillSubcategories {
        /// Reference TOML file holding the `[backfill]` section
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn reference_config(file: Option<&PathBuf>) -> Result<ReferenceConfig> {
    match file {
        Some(path) => {
            info!("Loading reference data from {}", path.display());
            load_reference_config(path)
        }
        None => default_reference_config(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing as early as possible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Non-fatal: variables can be set externally
    dotenv().ok();

    let cli = Cli::parse();
    let database_url = cli.database_url.unwrap_or_else(database::get_database_url);

    database::ensure_database_dir(&database_url)?;
    let db = create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db).await?;
    info!("Database ready.");

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(server::get_bind_addr);
            web::serve(&addr, AppState::new(db)).await?;
        }
        Commands::Seed { reset, file } => {
            let config = reference_config(file.as_ref())?;
            let summary = seed::seed_reference_data(&db, &config, reset)
                .await
                .inspect_err(|e| error!("Seeding failed: {}", e))?;
            info!(
                "Seeded: {} statuses, {} types, {} categories, {} subcategories",
                summary.statuses, summary.types, summary.categories, summary.subcategories
            );
        }
        Commands::BackfillSubcategories { file } => {
            let config = reference_config(file.as_ref())?;
            let added = seed::backfill_subcategories(&db, &config.backfill).await?;
            info!("Backfill complete: {} subcategories added", added);
        }
    }

    Ok(())
}
