//! itemsvc - item service command-line entry point
//!
//! - `serve`: run the HTTP item service
//! - `migrate`: create the items table on a fresh database

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

mod config;
mod tracing_setup;

use config::{DatabaseArgs, ListenArgs};
use itemsvc_server::db::{pool::create_lazy_pool, schema};

#[derive(Parser, Debug)]
#[command(name = "itemsvc", version, about = "HTTP item service backed by PostgreSQL")]
struct Cli {
    /// Env file loaded before reading configuration (missing file is ignored)
    #[arg(long, global = true, default_value = config::DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP item service
    Serve(ServeArgs),

    /// Create the items table if it does not exist
    Migrate(MigrateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    listen: ListenArgs,

    #[command(flatten)]
    db: DatabaseArgs,

    /// Create the items table before serving
    #[arg(long)]
    migrate: bool,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[command(flatten)]
    db: DatabaseArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = config::env_file_from_args(std::env::args_os());
    let env_loaded = config::load_env_file(&env_file)?;

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    if env_loaded {
        info!("Loaded environment from {}", cli.env_file.display());
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Migrate(args) => run_migrate(args).await?,
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let settings = args.db.pool_settings()?;

    // Connections open on first use, so the service starts even while the
    // store is down and answers 500 until it comes back.
    let pool = if args.migrate {
        let pool = itemsvc_server::create_pool(&settings)
            .await
            .context("failed to connect to database")?;
        schema::ensure(&pool).await.context("schema bootstrap failed")?;
        pool
    } else {
        create_lazy_pool(&settings)
    };

    itemsvc_server::run_server(pool, args.listen.server_config()).await?;
    Ok(())
}

async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let settings = args.db.pool_settings()?;
    let pool = itemsvc_server::create_pool(&settings)
        .await
        .context("failed to connect to database")?;

    schema::ensure(&pool).await.context("schema bootstrap failed")?;
    pool.close().await;
    Ok(())
}
