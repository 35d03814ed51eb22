//! Moves products from the legacy free-text category column to normalized
//! categories.
//!
//! Run with: cargo run --bin backfill-categories -- --dry-run

use anyhow::Context;
use clap::Parser;
use tracing::info;

use storefront_api::{
    config::load_config,
    db::establish_connection_from_app_config,
    services::catalog::category_backfill::{backfill_categories, BackfillOptions},
};

#[derive(Debug, Parser)]
#[command(name = "backfill-categories", about = "Backfill product categories from the legacy column")]
struct Cli {
    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Drop products.category after linking
    #[arg(long)]
    drop_legacy_column: bool,

    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let mut config = load_config().context("failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let db = establish_connection_from_app_config(&config).await?;
    let report = backfill_categories(
        &db,
        BackfillOptions {
            dry_run: cli.dry_run,
            drop_legacy_column: cli.drop_legacy_column,
        },
    )
    .await?;

    if !report.legacy_column_present {
        info!("No legacy category column; database already migrated");
        return Ok(());
    }

    info!(
        labels = report.labels.len(),
        created = report.categories_created,
        reused = report.categories_reused,
        linked = report.products_linked,
        dropped = report.legacy_column_dropped,
        dry_run = cli.dry_run,
        "Backfill complete"
    );
    for label in &report.labels {
        info!("  {}", label);
    }
    Ok(())
}
