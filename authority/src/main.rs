//! SecureWrap Authority
//!
//! Runs on a server reachable by every issued package. Stores one access
//! rule per package and answers the agent's pre-check and verify calls.
//!
//! Usage:
//!   securewrap-authority --port 8080 --database securewrap-rules.db
//!
//! Pass `--database :memory:` for a throwaway store.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use securewrap_authority::{AppState, build_router};
use securewrap_registry::{MemoryRuleRegistry, RuleRegistry, SqliteRuleRegistry};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "securewrap-authority")]
#[command(about = "SecureWrap access rule authority")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the rule database
    #[arg(short, long, default_value = "securewrap-rules.db")]
    database: PathBuf,

    /// Never explain verify denials
    #[arg(long)]
    vague_denials: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("SecureWrap Authority starting...");
    let registry = open_registry(&args.database)?;
    info!("{} rule(s) on record", registry.count()?);

    let state = AppState::new(registry).with_vague_denials(args.vague_denials);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;

    println!("\n========================================");
    println!("  SecureWrap Authority Running");
    println!("========================================");
    println!("  HTTP Port: {}", args.port);
    println!("  Database:  {}", args.database.display());
    println!("  Denials:   {}", if args.vague_denials { "vague" } else { "detailed" });
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Authority stopped");
    Ok(())
}

fn open_registry(path: &Path) -> Result<Arc<dyn RuleRegistry>> {
    if path.as_os_str() == ":memory:" {
        info!("Using in-memory rule store");
        return Ok(Arc::new(MemoryRuleRegistry::new()));
    }
    info!("Opening rule store at {:?}", path);
    let registry = SqliteRuleRegistry::open(path)
        .with_context(|| format!("Failed to open rule database {}", path.display()))?;
    Ok(Arc::new(registry))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
