// Account Service - Web Server
// REST API with Axum over the SQLite (or in-memory) account store

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use account_service::api::{create_router, AppState};
use account_service::{init_tracing, InMemoryAccountStore, SqliteAccountStore};

/// Account management HTTP server
#[derive(Parser, Debug)]
#[command(name = "account-server")]
#[command(author, version, about, long_about = None)]
struct ServerArgs {
    /// SQLite database file
    #[arg(long, env = "ACCOUNTS_DB", default_value = "accounts.db")]
    db: PathBuf,

    /// Address to bind
    #[arg(long, env = "ACCOUNTS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "ACCOUNTS_PORT", default_value_t = 3000)]
    port: u16,

    /// Keep accounts in memory instead of the database (lost on exit)
    #[arg(long)]
    in_memory: bool,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = ServerArgs::parse();

    tracing::info!("Account Service - Web Server v{}", account_service::VERSION);

    // Pick the store
    let state = if args.in_memory {
        tracing::warn!("Using in-memory store, accounts are not persisted");
        AppState::new(InMemoryAccountStore::new())
    } else {
        let store = SqliteAccountStore::open(&args.db)?;
        tracing::info!("Database opened: {}", args.db.display());
        AppState::new(store)
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on http://{}", addr);
    tracing::info!("  POST   /accounts                 - Create account");
    tracing::info!("  GET    /accounts                 - List accounts");
    tracing::info!("  GET    /accounts/:id             - Get account");
    tracing::info!("  PUT    /accounts/:id             - Update holder/number");
    tracing::info!("  PUT    /accounts/consignar/:id   - Deposit");
    tracing::info!("  PUT    /accounts/retirar/:id     - Withdraw");
    tracing::info!("  DELETE /accounts/:id             - Delete account");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
