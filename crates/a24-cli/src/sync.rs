//! Sync command handlers.
//!
//! Each invocation is recorded as one `sync_runs` row: created `queued`,
//! moved to `running`, then closed as `succeeded` with the report as its
//! summary or `failed` with the error text.

use a24_client::{Api24Client, ClientSettings};
use a24_core::AppConfig;
use a24_sync::{HttpImageProbe, PgShop, PgStaging, SyncOptions, SyncPhase, SyncReport, Syncer};
use clap::Subcommand;

use crate::fail_run_best_effort;

pub(crate) const TRIGGER_CLI: &str = "cli";
pub(crate) const TRIGGER_SCHEDULE: &str = "schedule";

/// Sub-commands available under `sync`.
#[derive(Debug, Subcommand)]
pub enum SyncCommands {
    /// Mirror the API24 category tree into shop categories
    Categories {
        /// Report what would change without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Page through API24 products into the staging table
    Products {
        /// Report what would change without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Create shop products from staged barcode families
    Create {
        /// Report what would change without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Drop stale staged rows and vanished categories
    Cleanup {
        /// Report what would change without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Categories, products, create and cleanup in one run
    All {
        /// Report what would change without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

impl SyncCommands {
    pub(crate) fn phase(&self) -> SyncPhase {
        match self {
            SyncCommands::Categories { .. } => SyncPhase::Categories,
            SyncCommands::Products { .. } => SyncPhase::Products,
            SyncCommands::Create { .. } => SyncPhase::Create,
            SyncCommands::Cleanup { .. } => SyncPhase::Cleanup,
            SyncCommands::All { .. } => SyncPhase::All,
        }
    }

    pub(crate) fn dry_run(&self) -> bool {
        match self {
            SyncCommands::Categories { dry_run }
            | SyncCommands::Products { dry_run }
            | SyncCommands::Create { dry_run }
            | SyncCommands::Cleanup { dry_run }
            | SyncCommands::All { dry_run } => *dry_run,
        }
    }
}

/// Run `phase` against the live API and database, recording a sync run.
///
/// # Errors
///
/// Returns an error if the API client or image probe cannot be built, the
/// sync run cannot be recorded, or the phase itself fails. A failed phase
/// still marks its run as `failed` before returning.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    phase: SyncPhase,
    dry_run: bool,
    trigger_source: &'static str,
) -> anyhow::Result<SyncReport> {
    let client = Api24Client::new(&ClientSettings::from_app_config(config))?;
    let probe = HttpImageProbe::new(config.image_probe_timeout_secs, &config.user_agent)?;
    let staging = PgStaging::new(pool.clone());
    let shop = PgShop::new(pool.clone());
    let syncer = Syncer::new(
        &client,
        &staging,
        &shop,
        &probe,
        SyncOptions::from_app_config(config, dry_run),
    );

    let run = a24_db::create_sync_run(pool, phase.as_str(), trigger_source, dry_run).await?;
    if let Err(e) = a24_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(run_id = %run.public_id, phase = %phase, trigger_source, dry_run, "sync run started");

    let report = match syncer.run(phase).await {
        Ok(report) => report,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let summary = match serde_json::to_value(&report) {
        Ok(summary) => summary,
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };
    let records = i32::try_from(report.records_processed()).unwrap_or(i32::MAX);
    if let Err(e) = a24_db::complete_sync_run(pool, run.id, records, &summary).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    tracing::info!(
        run_id = %run.public_id,
        records_processed = records,
        problems = report.problems(),
        "sync run succeeded"
    );
    Ok(report)
}

pub(crate) fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry run] " } else { "" };

    if let Some(c) = &report.categories {
        println!(
            "{prefix}categories: {} fetched, {} created, {} updated ({} slugs repaired), {} unchanged, {} duplicate ids, {} failed",
            c.fetched, c.created, c.updated, c.slugs_repaired, c.unchanged, c.duplicates, c.failed
        );
    }
    if let Some(p) = &report.products {
        let stop = if p.page_cap_hit {
            " (page cap reached)"
        } else if p.stopped_on_error {
            " (stopped on page error)"
        } else {
            ""
        };
        println!(
            "{prefix}products: {} pages{stop}, {} records, {} staged, {} rejected, {} failed",
            p.pages_fetched, p.records_seen, p.staged, p.rejected, p.failed
        );
    }
    if let Some(c) = &report.create {
        println!(
            "{prefix}create: {} simple + {} variable created ({} variations) from {} staged records",
            c.created_simple, c.created_variable, c.variations_created, c.staged_records
        );
        println!(
            "{prefix}  skipped: {} existing, {} duplicate sku, {} no image, {} no category, {} no variations; {} failed",
            c.skipped_existing,
            c.skipped_duplicate_sku,
            c.skipped_no_image,
            c.skipped_no_category,
            c.skipped_no_variations,
            c.failed
        );
    }
    if let Some(c) = &report.cleanup {
        let staged = if c.staged_skipped {
            "staged rows kept".to_string()
        } else {
            format!("{} stale staged rows deleted", c.staged_deleted)
        };
        let categories = if c.categories_skipped {
            "categories not checked".to_string()
        } else {
            format!(
                "{} categories deleted, {} kept with products",
                c.categories_deleted, c.categories_kept_with_products
            )
        };
        println!("{prefix}cleanup: {staged}; {categories}; {} failed", c.failed);
    }
}
