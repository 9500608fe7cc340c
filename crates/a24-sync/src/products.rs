//! Products phase: page through the upstream catalog into staging.

use std::time::Duration;

use a24_client::normalize_product;
use chrono::Utc;

use crate::report::ProductReport;
use crate::syncer::Syncer;

impl Syncer<'_> {
    /// Fetches pages from 1 until an empty page, normalizing each record and
    /// upserting it into staging by SKU.
    ///
    /// Never fails as a whole: a page error or the page cap ends pagination
    /// with a warning, and per-record problems are counted.
    pub(crate) async fn sync_products(&self) -> ProductReport {
        let started_at = Utc::now();
        let mut report = ProductReport {
            started_at: Some(started_at),
            ..ProductReport::default()
        };
        let max_pages = self.options.max_pages;
        let mut page = 1u32;

        loop {
            if page > max_pages {
                report.page_cap_hit = true;
                tracing::warn!(
                    max_pages,
                    "page cap reached before an empty page; stopping pagination"
                );
                break;
            }
            if page > 1 && self.options.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.inter_request_delay_ms))
                    .await;
            }

            let items = match self.source.fetch_products_page(page).await {
                Ok(items) => items,
                Err(e) => {
                    report.stopped_on_error = true;
                    tracing::warn!(page, error = %e, "product page request failed; stopping pagination");
                    break;
                }
            };
            if items.is_empty() {
                tracing::debug!(page, "empty page; catalog exhausted");
                break;
            }

            report.pages_fetched += 1;
            tracing::info!(page, records = items.len(), "fetched product page");

            for raw in items {
                report.records_seen += 1;
                let sku = raw.sku.clone();
                let product = match normalize_product(raw) {
                    Ok(product) => product,
                    Err(reason) => {
                        report.rejected += 1;
                        tracing::debug!(page, sku = ?sku, %reason, "rejected upstream product");
                        continue;
                    }
                };

                if self.options.dry_run {
                    report.staged += 1;
                    report.seen_skus.insert(product.sku);
                    continue;
                }
                match self.staging.upsert(&product, Utc::now()).await {
                    Ok(()) => report.staged += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(sku = %product.sku, error = %e, "failed to stage product");
                    }
                }
            }

            page += 1;
        }

        tracing::info!(
            pages = report.pages_fetched,
            seen = report.records_seen,
            staged = report.staged,
            rejected = report.rejected,
            failed = report.failed,
            dry_run = self.options.dry_run,
            "products phase finished"
        );
        report
    }
}
