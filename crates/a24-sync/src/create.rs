//! Classify-and-create phase: turn staged barcode groups into shop products.
//!
//! Each base barcode becomes at most one shop product. A base that already
//! has one is skipped, which makes the phase safe to re-run over unchanged
//! staging data.

use std::collections::{HashMap, HashSet};

use a24_core::{classify, to_slug, BarcodeGroup, NormalizedProduct, StagedIndex};
use a24_db::{
    DbError, NewProductAttribute, NewShopProduct, NewShopVariation, ProductType, ShopCategoryRow,
};

use crate::error::SyncError;
use crate::ports::ImageProbe;
use crate::report::CreateReport;
use crate::syncer::Syncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateOutcome {
    Created {
        kind: ProductType,
        variations: usize,
    },
    SkippedExisting,
    SkippedDuplicateSku,
    SkippedNoImage,
    SkippedNoCategory,
    SkippedNoVariations,
}

impl Syncer<'_> {
    pub(crate) async fn create_products(&self) -> Result<CreateReport, SyncError> {
        let records = self.staging.list_all().await?;
        let mut report = CreateReport {
            staged_records: records.len(),
            ..CreateReport::default()
        };

        let index = StagedIndex::new(records);
        let classification = classify(index.barcodes(), &index);
        report.simple_groups = classification.simple.len();
        report.variable_groups = classification.variable.len();
        tracing::info!(
            staged = report.staged_records,
            simple = report.simple_groups,
            variable = report.variable_groups,
            "classified staged products"
        );

        let categories = CategoryIndex::new(self.shop.list_categories().await?);
        let mut images = ImageResolver::new(self.probe);

        for group in &classification.simple {
            let outcome = self.create_simple(group, &categories, &mut images).await;
            tally(&mut report, &group.base, outcome);
        }
        for group in &classification.variable {
            let outcome = self
                .create_variable(group, &categories, &mut images, &mut report)
                .await;
            tally(&mut report, &group.base, outcome);
        }

        tracing::info!(
            created_simple = report.created_simple,
            created_variable = report.created_variable,
            variations = report.variations_created,
            skipped_existing = report.skipped_existing,
            skipped_duplicate_sku = report.skipped_duplicate_sku,
            skipped_no_image = report.skipped_no_image,
            skipped_no_category = report.skipped_no_category,
            skipped_no_variations = report.skipped_no_variations,
            failed = report.failed,
            dry_run = self.options.dry_run,
            "create phase finished"
        );
        Ok(report)
    }

    async fn create_simple(
        &self,
        group: &BarcodeGroup<'_>,
        categories: &CategoryIndex,
        images: &mut ImageResolver<'_>,
    ) -> Result<CreateOutcome, DbError> {
        if self.shop.product_exists(&group.base).await? {
            tracing::info!(base = %group.base, "shop product already exists; skipping");
            return Ok(CreateOutcome::SkippedExisting);
        }
        let Some(source) = group.source() else {
            return Ok(CreateOutcome::SkippedNoVariations);
        };
        if self.shop.sku_exists(&source.sku).await? {
            tracing::info!(base = %group.base, sku = %source.sku, "sku already in shop; skipping");
            return Ok(CreateOutcome::SkippedDuplicateSku);
        }
        let Some(category_ids) = self.category_chain(categories, source) else {
            return Ok(CreateOutcome::SkippedNoCategory);
        };
        let Some(image) = images.first_reachable(&source.image_candidates()).await else {
            tracing::warn!(base = %group.base, sku = %source.sku, "no reachable image; skipping");
            return Ok(CreateOutcome::SkippedNoImage);
        };

        let product = NewShopProduct {
            base_barcode: group.base.clone(),
            product_type: ProductType::Simple,
            sku: Some(source.sku.clone()),
            external_product_id: source.product_id.clone(),
            name: source.name.clone(),
            slug: product_slug(&source.name, &group.base),
            description: source.description.clone(),
            model: source.model.clone(),
            price: Some(source.price),
            sale_price: Some(source.sale_price),
            b2b_price: Some(source.b2b_price),
            stock: Some(source.stock),
            category_ids,
            attributes: union_attributes(&[source], None),
            gallery: images.gallery(source, &image),
            image_url: Some(image),
            variations: Vec::new(),
        };
        self.save(&product).await
    }

    async fn create_variable(
        &self,
        group: &BarcodeGroup<'_>,
        categories: &CategoryIndex,
        images: &mut ImageResolver<'_>,
        report: &mut CreateReport,
    ) -> Result<CreateOutcome, DbError> {
        if self.shop.product_exists(&group.base).await? {
            tracing::info!(base = %group.base, "shop product already exists; skipping");
            return Ok(CreateOutcome::SkippedExisting);
        }

        let axis = self.options.variation_attribute.as_str();
        let mut creatable: Vec<&NormalizedProduct> = Vec::new();
        let mut variations = Vec::new();
        let mut skus = HashSet::new();

        for &record in &group.records {
            let Some(axis_value) = record.attribute(axis) else {
                report.variations_skipped_no_attribute += 1;
                tracing::warn!(
                    base = %group.base,
                    sku = %record.sku,
                    attribute = %axis,
                    "variation lacks the variation attribute; skipping"
                );
                continue;
            };
            if !skus.insert(record.sku.as_str()) || self.shop.sku_exists(&record.sku).await? {
                report.variations_skipped_duplicate_sku += 1;
                tracing::info!(base = %group.base, sku = %record.sku, "variation sku already taken; skipping");
                continue;
            }

            variations.push(NewShopVariation {
                sku: record.sku.clone(),
                barcode: record.barcode.clone(),
                attribute_value: axis_value.value.clone(),
                price: record.price,
                sale_price: record.sale_price,
                b2b_price: record.b2b_price,
                stock: record.stock,
                image_url: images.first_reachable(&record.image_candidates()).await,
            });
            creatable.push(record);
        }

        // The parent takes its text, category and image candidates from the
        // first variation that will actually be created.
        let Some(&parent) = creatable.first() else {
            tracing::warn!(base = %group.base, "no creatable variations; skipping variable product");
            return Ok(CreateOutcome::SkippedNoVariations);
        };
        let Some(category_ids) = self.category_chain(categories, parent) else {
            return Ok(CreateOutcome::SkippedNoCategory);
        };

        let image = match images.first_reachable(&parent.image_candidates()).await {
            Some(url) => url,
            None => match variations.iter().find_map(|v| v.image_url.clone()) {
                Some(url) => url,
                None => {
                    tracing::warn!(base = %group.base, "no reachable image for variable product; skipping");
                    return Ok(CreateOutcome::SkippedNoImage);
                }
            },
        };

        let product = NewShopProduct {
            base_barcode: group.base.clone(),
            product_type: ProductType::Variable,
            sku: None,
            external_product_id: parent.product_id.clone(),
            name: parent.name.clone(),
            slug: product_slug(&parent.name, &group.base),
            description: parent.description.clone(),
            model: parent.model.clone(),
            price: None,
            sale_price: None,
            b2b_price: None,
            stock: None,
            category_ids,
            attributes: union_attributes(&creatable, Some(axis)),
            gallery: images.gallery(parent, &image),
            image_url: Some(image),
            variations,
        };
        self.save(&product).await
    }

    /// Shop category ids for `record`, root first. `None` means skip the product.
    fn category_chain(
        &self,
        categories: &CategoryIndex,
        record: &NormalizedProduct,
    ) -> Option<Vec<i64>> {
        let chain = categories.chain(&record.category_id);
        if chain.is_empty() {
            if self.options.require_category {
                tracing::warn!(
                    sku = %record.sku,
                    category_id = %record.category_id,
                    "no shop category for product; skipping"
                );
                return None;
            }
            tracing::info!(
                sku = %record.sku,
                category_id = %record.category_id,
                "no shop category for product; creating uncategorized"
            );
        }
        Some(chain)
    }

    async fn save(&self, product: &NewShopProduct) -> Result<CreateOutcome, DbError> {
        let outcome = CreateOutcome::Created {
            kind: product.product_type,
            variations: product.variations.len(),
        };
        if self.options.dry_run {
            tracing::info!(
                base = %product.base_barcode,
                kind = product.product_type.as_str(),
                variations = product.variations.len(),
                "dry run: would create shop product"
            );
            return Ok(outcome);
        }

        let created = self.shop.create_product(product).await?;
        tracing::info!(
            base = %product.base_barcode,
            kind = product.product_type.as_str(),
            product_id = created.id,
            variations = created.variation_ids.len(),
            "created shop product"
        );
        Ok(outcome)
    }
}

fn tally(report: &mut CreateReport, base: &str, outcome: Result<CreateOutcome, DbError>) {
    match outcome {
        Ok(CreateOutcome::Created { kind, variations }) => {
            match kind {
                ProductType::Simple => report.created_simple += 1,
                ProductType::Variable => report.created_variable += 1,
            }
            report.variations_created += variations;
        }
        Ok(CreateOutcome::SkippedExisting) => report.skipped_existing += 1,
        Ok(CreateOutcome::SkippedDuplicateSku) => report.skipped_duplicate_sku += 1,
        Ok(CreateOutcome::SkippedNoImage) => report.skipped_no_image += 1,
        Ok(CreateOutcome::SkippedNoCategory) => report.skipped_no_category += 1,
        Ok(CreateOutcome::SkippedNoVariations) => report.skipped_no_variations += 1,
        Err(e) if e.is_unique_violation() => {
            report.skipped_existing += 1;
            tracing::info!(base, "shop product created concurrently; skipping");
        }
        Err(e) => {
            report.failed += 1;
            tracing::warn!(base, error = %e, "failed to create shop product");
        }
    }
}

fn product_slug(name: &str, base: &str) -> String {
    let slug = to_slug(name);
    if slug.is_empty() {
        format!("product-{}", to_slug(base))
    } else {
        slug
    }
}

/// Merges the attributes of `records` by name, keeping first-seen order of
/// names and values. The attribute named `axis` is flagged as the variation axis.
fn union_attributes(records: &[&NormalizedProduct], axis: Option<&str>) -> Vec<NewProductAttribute> {
    let mut merged: Vec<NewProductAttribute> = Vec::new();
    for attribute in records.iter().flat_map(|r| &r.attributes) {
        match merged.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => {
                if !existing.options.contains(&attribute.value) {
                    existing.options.push(attribute.value.clone());
                }
            }
            None => merged.push(NewProductAttribute {
                name: attribute.name.clone(),
                slug: attribute.slug.clone(),
                options: vec![attribute.value.clone()],
                is_variation: axis == Some(attribute.name.as_str()),
            }),
        }
    }
    merged
}

/// Shop category terms indexed for ancestor lookups by upstream id.
struct CategoryIndex {
    rows: Vec<ShopCategoryRow>,
    by_external: HashMap<String, usize>,
    by_id: HashMap<i64, usize>,
}

impl CategoryIndex {
    fn new(rows: Vec<ShopCategoryRow>) -> Self {
        let by_external = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.external_id.clone(), idx))
            .collect();
        let by_id = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.id, idx))
            .collect();
        Self {
            rows,
            by_external,
            by_id,
        }
    }

    /// Term ids from the root down to the term for `external_id`; empty when unmapped.
    fn chain(&self, external_id: &str) -> Vec<i64> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.by_external.get(external_id).map(|&idx| &self.rows[idx]);
        while let Some(row) = current {
            if !seen.insert(row.id) {
                break;
            }
            chain.push(row.id);
            current = row
                .parent_id
                .and_then(|parent| self.by_id.get(&parent))
                .map(|&idx| &self.rows[idx]);
        }
        chain.reverse();
        chain
    }
}

/// Probes image candidates, remembering each URL's result for the phase.
struct ImageResolver<'p> {
    probe: &'p dyn ImageProbe,
    cache: HashMap<String, bool>,
}

impl<'p> ImageResolver<'p> {
    fn new(probe: &'p dyn ImageProbe) -> Self {
        Self {
            probe,
            cache: HashMap::new(),
        }
    }

    async fn first_reachable(&mut self, candidates: &[&str]) -> Option<String> {
        for url in candidates {
            if self.reachable(url).await {
                return Some((*url).to_owned());
            }
        }
        None
    }

    /// Image URLs of `record` other than `featured`, minus any already found broken.
    fn gallery(&self, record: &NormalizedProduct, featured: &str) -> Vec<String> {
        record
            .image_candidates()
            .into_iter()
            .filter(|url| *url != featured && self.cache.get(*url) != Some(&false))
            .map(str::to_owned)
            .collect()
    }

    async fn reachable(&mut self, url: &str) -> bool {
        if let Some(&known) = self.cache.get(url) {
            return known;
        }
        let ok = self.probe.is_reachable(url).await;
        self.cache.insert(url.to_owned(), ok);
        ok
    }
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
