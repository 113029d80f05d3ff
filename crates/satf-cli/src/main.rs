use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use satf_store::PgTenderStore;
use satf_sync::{SyncConfig, SyncPipeline, DEFAULT_PAGE_NUMBER};

#[derive(Debug, Parser)]
#[command(name = "satf-cli")]
#[command(about = "SATF command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass against the tender feed
    Sync {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Apply database migrations
    Migrate,
    /// Serve the JSON API (and the cron scheduler when enabled)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync {
        page: None,
        page_size: None,
    }) {
        Commands::Sync { page, page_size } => {
            let config = SyncConfig::from_env();
            let pipeline = SyncPipeline::from_config(&config)?;
            let summary = pipeline
                .run_once(
                    page.unwrap_or(DEFAULT_PAGE_NUMBER),
                    page_size.unwrap_or(config.page_size),
                )
                .await?;
            println!(
                "sync complete: run_id={} fetched={} processed={} failed={}",
                summary.run_id, summary.total_fetched, summary.processed_count, summary.error_count
            );
            for sample in &summary.errors {
                println!("  {}: {}", sample.ocid, sample.message);
            }
        }
        Commands::Migrate => {
            let config = SyncConfig::from_env();
            let store = PgTenderStore::connect(&config.database_url)
                .await
                .context("connecting to database")?;
            store.run_migrations().await.context("applying migrations")?;
            println!("migrations applied");
        }
        Commands::Serve => {
            let config = SyncConfig::from_env();
            let pipeline = SyncPipeline::from_config(&config)?;
            let scheduler = pipeline.maybe_build_scheduler(&config).await?;
            if let Some(mut scheduler) = scheduler {
                scheduler.start().await.context("starting scheduler")?;
            }
            satf_web::serve_from_env().await?;
        }
    }

    Ok(())
}
