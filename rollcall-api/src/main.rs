//! rollcall-api - RFID attendance service
//!
//! Receives scan events from the reader device, resolves them into
//! attendance records, and serves the admin CRUD surfaces over the same
//! database.

use anyhow::Result;
use clap::Parser;
use rollcall_common::config::{ensure_data_folder, resolve_data_folder};
use rollcall_common::db::init_database;
use rollcall_common::events::NotificationSink;
use rollcall_api::{build_router, AppState};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "rollcall-api", about = "RFID attendance service")]
struct Args {
    /// Data folder holding the SQLite database
    #[arg(long)]
    root_folder: Option<String>,

    /// Address to bind the HTTP server on
    #[arg(long, env = "ROLLCALL_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port for the HTTP server
    #[arg(long, env = "ROLLCALL_PORT", default_value_t = 5730)]
    port: u16,

    /// Optional webhook URL for outcome notifications
    #[arg(long, env = "ROLLCALL_WEBHOOK_URL")]
    webhook_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber before anything else
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Rollcall attendance service (rollcall-api) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let data_folder = resolve_data_folder(args.root_folder.as_deref())?;
    let db_path = ensure_data_folder(&data_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    if args.webhook_url.is_some() {
        info!("✓ Outcome notifications enabled");
    } else {
        info!("No webhook configured; outcome notifications disabled");
    }
    let sink = NotificationSink::spawn(args.webhook_url);

    let state = AppState::new(pool, sink);
    let app = build_router(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("rollcall-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
