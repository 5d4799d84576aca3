//! Club Activities Server
//!
//! HTTP backend for club events: catalog, capacity-limited registration,
//! accounts, statistics and CSV export.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use anyhow::Context;
use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const MAX_DB_CONNECTIONS: u32 = 10;

/// Club Activities - event registration backend
#[derive(Parser, Debug)]
#[command(name = "clubs-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./clubs-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Apply pending database migrations before serving
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    tracing::info!("Starting clubs-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader
        .load()
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let listen_addr = loaded_config.server.listen;

    let db_pool = connect_database(args.migrate).await?;
    let state = AppState::new(db_pool.clone(), loaded_config.into_shared());

    // SIGHUP swaps config sections in place; the listener itself is not rebound.
    let reload_stop = spawn_config_reload_handler(state.clone(), config_loader);

    let result = run_server(build_router(state), listen_addr).await;

    reload_stop.notify_one();
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.context("serving HTTP")
}

/// Open the pool from `DATABASE_URL`, optionally applying migrations.
async fn connect_database(migrate: bool) -> anyhow::Result<PgPool> {
    let database_url = get_database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(&database_url)
        .await
        .context("connecting to database")?;

    if migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("Migrations completed successfully");
    }

    Ok(pool)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
