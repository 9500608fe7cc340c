mod runs;
mod schedule;
mod staged;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::runs::RunsCommands;
use crate::staged::StagedCommands;
use crate::sync::SyncCommands;

#[derive(Debug, Parser)]
#[command(name = "a24-cli")]
#[command(about = "API24 to shop catalog sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one sync phase, or the whole pipeline
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Inspect the staging table
    Staged {
        #[command(subcommand)]
        command: StagedCommands,
    },
    /// Inspect recorded sync runs
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Run the full pipeline on `A24_SYNC_CRON` until Ctrl-C
    Schedule,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = a24_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_log_filter(&config)))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("a24-cli ready; run with --help to list commands");
        return Ok(());
    };

    let pool_config = a24_db::PoolConfig::from_app_config(&config);
    let pool = a24_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                a24_db::ping(&pool).await?;
                println!("database reachable");
            }
            DbCommands::Migrate => {
                let applied = a24_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Sync { command } => {
            let report = sync::run_sync(
                &pool,
                &config,
                command.phase(),
                command.dry_run(),
                sync::TRIGGER_CLI,
            )
            .await?;
            sync::print_report(&report);
        }
        Commands::Staged { command } => match command {
            StagedCommands::List { barcode, limit } => {
                staged::run_staged_list(&pool, barcode.as_deref(), limit).await?;
            }
        },
        Commands::Runs { command } => match command {
            RunsCommands::List { limit } => runs::run_runs_list(&pool, limit).await?,
            RunsCommands::Show { id } => runs::run_runs_show(&pool, id).await?,
        },
        Commands::Schedule => schedule::run_schedule(pool, config).await?,
    }

    Ok(())
}

/// `A24_DEBUG` forces debug output; otherwise `A24_LOG_LEVEL` applies.
fn default_log_filter(config: &a24_core::AppConfig) -> String {
    if config.debug {
        "debug".to_string()
    } else {
        config.log_level.clone()
    }
}

/// Attempt to mark a sync run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = a24_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark sync run as failed"
        );
    }
}

#[cfg(test)]
mod tests;
