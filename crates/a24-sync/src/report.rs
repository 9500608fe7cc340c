//! Per-phase counters. Serialized into `sync_runs.summary`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    /// Subset of `updated` whose stored slug no longer matched the name.
    pub slugs_repaired: usize,
    pub unchanged: usize,
    /// Later records repeating an id already seen; never written.
    pub duplicates: usize,
    pub failed: usize,
    /// Upstream ids seen in this pass; used by cleanup in an `all` run.
    #[serde(skip)]
    pub upstream_ids: HashSet<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductReport {
    pub pages_fetched: u32,
    pub records_seen: usize,
    pub staged: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Stopped because `max_pages` was reached before an empty page.
    pub page_cap_hit: bool,
    /// Stopped because a page request failed.
    pub stopped_on_error: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// SKUs a dry run would have staged; lets a dry cleanup count accurately.
    #[serde(skip)]
    pub seen_skus: HashSet<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateReport {
    pub staged_records: usize,
    pub simple_groups: usize,
    pub variable_groups: usize,
    pub created_simple: usize,
    pub created_variable: usize,
    pub variations_created: usize,
    pub skipped_existing: usize,
    pub skipped_duplicate_sku: usize,
    pub skipped_no_image: usize,
    pub skipped_no_category: usize,
    pub skipped_no_variations: usize,
    pub variations_skipped_no_attribute: usize,
    pub variations_skipped_duplicate_sku: usize,
    pub failed: usize,
}

impl CreateReport {
    #[must_use]
    pub fn created(&self) -> usize {
        self.created_simple + self.created_variable
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub staged_deleted: u64,
    /// No products pass fetched a page in this invocation.
    pub staged_skipped: bool,
    pub categories_deleted: usize,
    pub categories_kept_with_products: usize,
    /// Not an `all` run, or the categories phase did not succeed.
    pub categories_skipped: bool,
    pub failed: usize,
}

/// Reports of the phases that ran in one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<ProductReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<CreateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,
}

impl SyncReport {
    /// Records written (or that would be written, in a dry run) across phases.
    #[must_use]
    pub fn records_processed(&self) -> usize {
        let categories = self
            .categories
            .as_ref()
            .map_or(0, |r| r.created + r.updated);
        let staged = self.products.as_ref().map_or(0, |r| r.staged);
        let created = self.create.as_ref().map_or(0, CreateReport::created);
        let deleted = self.cleanup.as_ref().map_or(0, |r| {
            usize::try_from(r.staged_deleted).unwrap_or(usize::MAX) + r.categories_deleted
        });
        categories
            .saturating_add(staged)
            .saturating_add(created)
            .saturating_add(deleted)
    }

    /// Records that were dropped or failed.
    #[must_use]
    pub fn problems(&self) -> usize {
        self.categories.as_ref().map_or(0, |r| r.failed)
            + self.products.as_ref().map_or(0, |r| r.failed + r.rejected)
            + self.create.as_ref().map_or(0, |r| r.failed)
            + self.cleanup.as_ref().map_or(0, |r| r.failed)
    }
}
