use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pg_schema_drift::{ingest::CatalogIngestor, RenderHints};

/// Computes the DDL migration plan between a live PostgreSQL database and a target schema
/// snapshot, printing ordered statements and their hazards. The plan is advisory: this CLI
/// does not execute anything against the database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection string for the "old" (current) database.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Enable verbose (info level) logging.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    let old_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&cli.database_url)
        .await
        .context("connecting to database")?;

    let tx = old_pool.begin().await.context("starting read snapshot")?;
    let mut ingestor = pg_schema_drift::ingest::PgCatalogIngestor::new(tx);
    let old_schema = ingestor.load().await.context("loading current schema")?;

    // A real deployment compares against a target snapshot (e.g. loaded from a temp
    // database the caller provisioned from migration files). That provisioning step is
    // outside this crate's scope; here we just demonstrate an empty-target no-op plan.
    let new_schema = pg_schema_drift::Schema::new();

    let plan = pg_schema_drift::diff(&old_schema, &new_schema, &RenderHints::default())?;

    info!(statement_count = plan.len(), "migration plan computed");
    for statement in &plan {
        if statement.is_barrier {
            println!("-- barrier: commit and start a new transaction");
        }
        if !statement.hazards.is_empty() {
            println!("-- hazards: {:?}", statement.hazards);
        }
        println!("{}", statement.sql);
    }

    Ok(())
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}
