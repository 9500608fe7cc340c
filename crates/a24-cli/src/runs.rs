//! Read-only views over recorded sync runs.

use clap::Subcommand;

/// Sub-commands available under `runs`.
#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// Show the most recent sync runs
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show one run with its full summary
    Show {
        /// Numeric run id from `runs list`
        id: i64,
    },
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs_list(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = a24_db::list_sync_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no sync runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<8}{:<12}{:<10}{:<6}{:<11}{:<22}{:>9}",
        "ID", "PHASE", "TRIGGER", "DRY", "STATUS", "STARTED", "RECORDS"
    );
    for run in &runs {
        let started = run.started_at.map_or_else(
            || "\u{2014}".to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        println!(
            "{:<8}{:<12}{:<10}{:<6}{:<11}{:<22}{:>9}",
            run.id,
            run.phase,
            run.trigger_source,
            if run.dry_run { "yes" } else { "no" },
            run.status,
            started,
            run.records_processed
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the run does not exist or the query fails.
pub(crate) async fn run_runs_show(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let run = match a24_db::get_sync_run(pool, id).await {
        Ok(run) => run,
        Err(a24_db::DbError::NotFound) => anyhow::bail!("sync run {id} not found"),
        Err(e) => return Err(e.into()),
    };

    println!("run {} ({})", run.id, run.public_id);
    println!("  phase:     {}", run.phase);
    println!("  trigger:   {}", run.trigger_source);
    println!("  dry run:   {}", run.dry_run);
    println!("  status:    {}", run.status);
    if let Some(started) = run.started_at {
        println!("  started:   {started}");
    }
    if let Some(completed) = run.completed_at {
        println!("  completed: {completed}");
    }
    println!("  records:   {}", run.records_processed);
    if let Some(error) = &run.error_message {
        println!("  error:     {error}");
    }
    if let Some(summary) = &run.summary {
        println!("{}", serde_json::to_string_pretty(&summary.0)?);
    }
    Ok(())
}
