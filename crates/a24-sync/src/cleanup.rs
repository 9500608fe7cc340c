//! Cleanup phase: drop staged rows and shop categories that vanished upstream.

use crate::error::SyncError;
use crate::report::CleanupReport;
use crate::syncer::{CleanupScope, Syncer};

impl Syncer<'_> {
    /// Removes what earlier phases of this invocation proved stale.
    ///
    /// Staged rows are only pruned after a products pass that fetched at
    /// least one page and ended on an empty page; categories only after a successful categories pass in
    /// an `all` run. Without that evidence the step is skipped.
    pub(crate) async fn cleanup(&self, scope: &CleanupScope) -> Result<CleanupReport, SyncError> {
        let mut report = CleanupReport::default();

        match scope.staged_cutoff {
            Some(cutoff) if self.options.dry_run => {
                let stale = self
                    .staging
                    .list_all()
                    .await?
                    .into_iter()
                    .filter(|p| !scope.dry_run_skus.contains(&p.sku))
                    .count();
                report.staged_deleted = u64::try_from(stale).unwrap_or(u64::MAX);
                tracing::info!(%cutoff, stale, "dry run: would delete stale staged products");
            }
            Some(cutoff) => {
                report.staged_deleted = self.staging.delete_stale(cutoff).await?;
                tracing::info!(%cutoff, deleted = report.staged_deleted, "deleted stale staged products");
            }
            None => {
                report.staged_skipped = true;
                tracing::info!("no complete products pass in this run; keeping staged products");
            }
        }

        match &scope.upstream_category_ids {
            Some(upstream) if upstream.is_empty() => {
                report.categories_skipped = true;
                tracing::warn!("upstream returned no categories; keeping shop categories");
            }
            Some(upstream) => {
                for row in self.shop.list_categories().await? {
                    if upstream.contains(&row.external_id) {
                        continue;
                    }
                    match self.shop.category_has_products(row.id).await {
                        Ok(true) => {
                            report.categories_kept_with_products += 1;
                            tracing::info!(
                                category_id = %row.external_id,
                                "category gone upstream but still has products; keeping"
                            );
                        }
                        Ok(false) => {
                            if !self.options.dry_run {
                                if let Err(e) = self.shop.delete_category(row.id).await {
                                    report.failed += 1;
                                    tracing::warn!(
                                        category_id = %row.external_id,
                                        error = %e,
                                        "failed to delete category"
                                    );
                                    continue;
                                }
                            }
                            report.categories_deleted += 1;
                            tracing::info!(
                                category_id = %row.external_id,
                                name = %row.name,
                                dry_run = self.options.dry_run,
                                "deleted category missing upstream"
                            );
                        }
                        Err(e) => {
                            report.failed += 1;
                            tracing::warn!(
                                category_id = %row.external_id,
                                error = %e,
                                "failed to check category products"
                            );
                        }
                    }
                }
            }
            None => {
                report.categories_skipped = true;
                tracing::debug!("category cleanup only runs after a categories pass in an all run");
            }
        }

        Ok(report)
    }
}
