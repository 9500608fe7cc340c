use std::collections::HashSet;
use std::fmt;

use a24_core::AppConfig;
use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::ports::{CatalogSource, ImageProbe, ShopStore, StagingStore};
use crate::report::SyncReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Categories,
    Products,
    Create,
    Cleanup,
    All,
}

impl SyncPhase {
    /// Label stored in `sync_runs.phase`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncPhase::Categories => "categories",
            SyncPhase::Products => "products",
            SyncPhase::Create => "create",
            SyncPhase::Cleanup => "cleanup",
            SyncPhase::All => "all",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for one invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub max_pages: u32,
    pub inter_request_delay_ms: u64,
    pub variation_attribute: String,
    pub require_category: bool,
    /// Read everything, decide everything, write nothing.
    pub dry_run: bool,
}

impl SyncOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, dry_run: bool) -> Self {
        Self {
            max_pages: config.max_pages,
            inter_request_delay_ms: config.inter_request_delay_ms,
            variation_attribute: config.variation_attribute.clone(),
            require_category: config.require_category,
            dry_run,
        }
    }
}

/// What cleanup may rely on from earlier phases of the same invocation.
#[derive(Debug, Default)]
pub(crate) struct CleanupScope {
    /// Start of a products pass that fetched at least one page and read the
    /// catalog through to its empty final page.
    pub staged_cutoff: Option<DateTime<Utc>>,
    /// SKUs that pass would have refreshed, when it was a dry run.
    pub dry_run_skus: HashSet<String>,
    /// Upstream category ids from a successful categories pass in an `all` run.
    pub upstream_category_ids: Option<HashSet<String>>,
}

/// Runs sync phases against a catalog source and two stores.
pub struct Syncer<'a> {
    pub(crate) source: &'a dyn CatalogSource,
    pub(crate) staging: &'a dyn StagingStore,
    pub(crate) shop: &'a dyn ShopStore,
    pub(crate) probe: &'a dyn ImageProbe,
    pub(crate) options: SyncOptions,
}

impl<'a> Syncer<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn CatalogSource,
        staging: &'a dyn StagingStore,
        shop: &'a dyn ShopStore,
        probe: &'a dyn ImageProbe,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            staging,
            shop,
            probe,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Runs `phase` (or every phase, in order, for [`SyncPhase::All`]).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CategoryFetch`] if the category list cannot be
    /// fetched, and [`SyncError::Db`] if a store fails outside a per-record
    /// operation. Per-record failures are counted in the report instead.
    pub async fn run(&self, phase: SyncPhase) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..SyncReport::default()
        };
        let mut scope = CleanupScope::default();

        tracing::info!(phase = %phase, dry_run = self.options.dry_run, "sync started");

        if matches!(phase, SyncPhase::Categories | SyncPhase::All) {
            let categories = self.sync_categories().await?;
            if phase == SyncPhase::All {
                scope.upstream_category_ids = Some(categories.upstream_ids.clone());
            }
            report.categories = Some(categories);
        }

        if matches!(phase, SyncPhase::Products | SyncPhase::All) {
            let products = self.sync_products().await;
            let complete = !products.stopped_on_error && !products.page_cap_hit;
            if products.pages_fetched > 0 && complete {
                scope.staged_cutoff = products.started_at;
                scope.dry_run_skus.clone_from(&products.seen_skus);
            }
            report.products = Some(products);
        }

        if matches!(phase, SyncPhase::Create | SyncPhase::All) {
            report.create = Some(self.create_products().await?);
        }

        if matches!(phase, SyncPhase::Cleanup | SyncPhase::All) {
            report.cleanup = Some(self.cleanup(&scope).await?);
        }

        tracing::info!(
            phase = %phase,
            records_processed = report.records_processed(),
            problems = report.problems(),
            "sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "syncer_test.rs"]
mod tests;
