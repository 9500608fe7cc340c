//! Read-only views over the staging table.

use a24_core::NormalizedProduct;
use clap::Subcommand;

/// Sub-commands available under `staged`.
#[derive(Debug, Subcommand)]
pub enum StagedCommands {
    /// List staged products, or one barcode family
    List {
        /// Show the record with this base barcode and its `_N` variations
        #[arg(long)]
        barcode: Option<String>,
        /// Maximum number of rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

/// Print staged products as a table.
///
/// With `barcode`, shows the bare record for its base (if any) followed by
/// every `base_N` variation, the same lookups classification uses.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_staged_list(
    pool: &sqlx::PgPool,
    barcode: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let rows = match barcode {
        Some(barcode) => {
            let base = a24_core::base_barcode(barcode);
            let mut rows = a24_db::find_staged_by_barcode(pool, base).await?;
            rows.extend(a24_db::find_staged_by_barcode_prefix(pool, base).await?);
            rows
        }
        None => a24_db::list_staged_products(pool).await?,
    };

    if rows.is_empty() {
        println!(
            "no staged products{}; run `sync products` first",
            barcode.map(|b| format!(" for barcode {b}")).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<20}{:<18}{:>10}{:>10}{:>7}  NAME",
        "BARCODE", "SKU", "PRICE", "SALE", "STOCK"
    );
    for row in rows.iter().take(limit) {
        println!("{}", format_row(row));
    }

    let total = a24_db::count_staged_products(pool).await?;
    println!("{} of {} matching rows shown; {total} staged in total", rows.len().min(limit), rows.len());
    Ok(())
}

fn format_row(row: &NormalizedProduct) -> String {
    format!(
        "{:<20}{:<18}{:>10}{:>10}{:>7}  {}",
        truncate(&row.barcode, 19),
        truncate(&row.sku, 17),
        row.price.round_dp(2),
        row.sale_price.round_dp(2),
        row.stock,
        row.name
    )
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}
