//! capstone-migrate — operator interface to the API database schema.

use capstone::api::ApiConfig;
use capstone::db::Db;
use capstone::db::migrate::{migration_status, resolve_migrations_path, run_migrations};
use capstone::telemetry::init_telemetry;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "capstone-migrate", about = "Apply and inspect API database migrations")]
struct Cli {
    /// Migrations directory (defaults to API_MIGRATIONS_PATH)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations
    Up,
    /// List migrations and when each was applied
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ApiConfig::from_env()?;
    let _guard = init_telemetry(config.common.telemetry("capstone-migrate"))?;

    let path = cli.path.unwrap_or_else(|| config.migrations_path.clone());
    let dir = resolve_migrations_path(&path)?;

    // Propagate instead of exiting so the telemetry guard still flushes.
    let db = match Db::connect(&config.database()).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "database connection failed");
            return Err(e.into());
        }
    };
    let result = match cli.command {
        Command::Up => cmd_up(&db, dir).await,
        Command::Status { json } => cmd_status(&db, dir, json).await,
    };
    db.close().await;
    result
}

async fn cmd_up(db: &Db, dir: PathBuf) -> anyhow::Result<()> {
    let report = run_migrations(db, &dir).await?;

    if report.is_noop() {
        println!("Up to date ({} migration(s)).", report.total);
        return Ok(());
    }

    for version in &report.applied {
        println!("Applied: {version}");
    }
    println!("\n{} of {} migration(s) applied", report.applied.len(), report.total);
    Ok(())
}

async fn cmd_status(db: &Db, dir: PathBuf, json: bool) -> anyhow::Result<()> {
    let status = migration_status(db, &dir).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status.is_empty() {
        println!("No migrations found in {}.", dir.display());
        return Ok(());
    }

    println!("{:<16}  {:<40}  APPLIED", "VERSION", "DESCRIPTION");
    println!("{}", "-".repeat(80));

    for entry in &status {
        let applied = entry
            .applied_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "pending".to_string());
        println!(
            "{:<16}  {:<40}  {}",
            entry.version, entry.description, applied
        );
    }

    let pending = status.iter().filter(|s| s.applied_at.is_none()).count();
    println!("\n{} migration(s), {pending} pending", status.len());
    Ok(())
}
