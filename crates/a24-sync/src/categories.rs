//! Categories phase: mirror the API24 category forest into shop terms.

use a24_core::{Category, CategoryTree};
use a24_db::DbError;

use crate::error::SyncError;
use crate::report::CategoryReport;
use crate::syncer::Syncer;

enum TermOutcome {
    Created(i64),
    Updated { id: i64, slug_repaired: bool },
    Unchanged(i64),
    /// Dry run on a term that does not exist yet.
    WouldCreate,
}

impl Syncer<'_> {
    /// Fetches the category list, builds the forest and upserts one shop term
    /// per category, parents before children.
    pub(crate) async fn sync_categories(&self) -> Result<CategoryReport, SyncError> {
        let raw = self
            .source
            .fetch_categories()
            .await
            .map_err(SyncError::CategoryFetch)?;

        let categories: Vec<Category> = raw
            .into_iter()
            .filter_map(a24_client::Api24Category::into_category)
            .collect();

        let mut report = CategoryReport {
            fetched: categories.len(),
            upstream_ids: categories.iter().map(|c| c.id.clone()).collect(),
            ..CategoryReport::default()
        };

        let mut tree = CategoryTree::build(categories);
        tracing::info!(
            categories = tree.len(),
            roots = tree.roots().len(),
            "category tree built"
        );

        for idx in tree.walk() {
            let Some(node) = tree.node(idx) else { continue };
            let category = node.category.clone();
            if !tree.owns_id(idx) {
                report.duplicates += 1;
                tracing::warn!(
                    category_id = %category.id,
                    name = %category.name,
                    "duplicate category id; keeping the first record"
                );
                continue;
            }
            let parent_term = node
                .parent()
                .and_then(|p| tree.node(p))
                .and_then(|p| p.term_id);

            match self.upsert_term(&category, parent_term).await {
                Ok(outcome) => {
                    let term_id = match outcome {
                        TermOutcome::Created(id) => {
                            report.created += 1;
                            Some(id)
                        }
                        TermOutcome::WouldCreate => {
                            report.created += 1;
                            None
                        }
                        TermOutcome::Updated { id, slug_repaired } => {
                            report.updated += 1;
                            if slug_repaired {
                                report.slugs_repaired += 1;
                            }
                            Some(id)
                        }
                        TermOutcome::Unchanged(id) => {
                            report.unchanged += 1;
                            Some(id)
                        }
                    };
                    if let Some(node) = tree.node_mut(idx) {
                        node.term_id = term_id;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        category_id = %category.id,
                        name = %category.name,
                        error = %e,
                        "failed to upsert category term"
                    );
                }
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            slugs_repaired = report.slugs_repaired,
            unchanged = report.unchanged,
            duplicates = report.duplicates,
            failed = report.failed,
            dry_run = self.options.dry_run,
            "categories phase finished"
        );
        Ok(report)
    }

    async fn upsert_term(
        &self,
        category: &Category,
        parent_term: Option<i64>,
    ) -> Result<TermOutcome, DbError> {
        let slug = term_slug(category);

        let existing = match self.shop.find_category(&category.id).await? {
            Some(existing) => existing,
            None if self.options.dry_run => return Ok(TermOutcome::WouldCreate),
            None => {
                match self
                    .shop
                    .insert_category(&category.id, &category.name, &slug, parent_term)
                    .await
                {
                    Ok(row) => return Ok(TermOutcome::Created(row.id)),
                    // Created concurrently; fall through and reconcile it.
                    Err(e) if e.is_unique_violation() => self
                        .shop
                        .find_category(&category.id)
                        .await?
                        .ok_or(DbError::NotFound)?,
                    Err(e) => return Err(e),
                }
            }
        };

        let slug_repaired = existing.slug != slug;
        if !slug_repaired && existing.name == category.name && existing.parent_id == parent_term {
            return Ok(TermOutcome::Unchanged(existing.id));
        }
        if slug_repaired {
            tracing::info!(
                category_id = %category.id,
                stored = %existing.slug,
                expected = %slug,
                "repairing category slug"
            );
        }
        if !self.options.dry_run {
            self.shop
                .update_category(existing.id, &category.name, &slug, parent_term)
                .await?;
        }
        Ok(TermOutcome::Updated {
            id: existing.id,
            slug_repaired,
        })
    }
}

/// Names that transliterate to nothing still need a usable slug.
pub(crate) fn term_slug(category: &Category) -> String {
    if category.slug.is_empty() {
        format!("category-{}", a24_core::to_slug(&category.id))
    } else {
        category.slug.clone()
    }
}
