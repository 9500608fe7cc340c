//! In-memory collaborators for phase tests.

use std::collections::HashSet;
use std::sync::Mutex;

use a24_client::{Api24Category, Api24Product, ClientError};
use a24_core::{NormalizedProduct, ProductAttribute};
use a24_db::{CreatedProduct, DbError, NewShopProduct, ShopCategoryRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::SyncError;
use crate::ports::{CatalogSource, ImageProbe, ShopStore, StagingStore};
use crate::report::SyncReport;
use crate::syncer::{SyncOptions, SyncPhase, Syncer};

fn unavailable(what: &str) -> ClientError {
    ClientError::UnexpectedStatus {
        status: 503,
        url: format!("https://api24.test/{what}"),
    }
}

#[derive(Default)]
pub(crate) struct FakeSource {
    /// `None` makes the categories request fail.
    pub categories: Option<Value>,
    /// Page bodies, page 1 first. Pages past the end are empty.
    pub pages: Vec<Value>,
    pub failing_page: Option<u32>,
    /// Serve the first page forever.
    pub endless: bool,
    pub requested_pages: Mutex<Vec<u32>>,
}

impl FakeSource {
    pub fn with_categories(categories: Value) -> Self {
        Self {
            categories: Some(categories),
            ..Self::default()
        }
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_categories(&self) -> Result<Vec<Api24Category>, ClientError> {
        let body = self.categories.clone().ok_or_else(|| unavailable("categories"))?;
        Ok(serde_json::from_value(body).unwrap())
    }

    async fn fetch_products_page(&self, page: u32) -> Result<Vec<Api24Product>, ClientError> {
        self.requested_pages.lock().unwrap().push(page);
        if self.failing_page == Some(page) {
            return Err(unavailable("products"));
        }
        let idx = if self.endless { 0 } else { page as usize - 1 };
        let body = self.pages.get(idx).cloned().unwrap_or(Value::Null);
        let products: Option<Vec<Api24Product>> = serde_json::from_value(body).unwrap();
        Ok(products.unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeStaging {
    pub rows: Mutex<Vec<(NormalizedProduct, DateTime<Utc>)>>,
}

impl FakeStaging {
    pub fn seeded(rows: Vec<NormalizedProduct>, synced_at: DateTime<Utc>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().map(|p| (p, synced_at)).collect()),
        }
    }

    pub fn skus(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.sku.clone())
            .collect()
    }
}

#[async_trait]
impl StagingStore for FakeStaging {
    async fn upsert(
        &self,
        product: &NormalizedProduct,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|(p, _)| p.sku == product.sku) {
            Some(row) => *row = (product.clone(), synced_at),
            None => rows.push((product.clone(), synced_at)),
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<NormalizedProduct>, DbError> {
        Ok(self.rows.lock().unwrap().iter().map(|(p, _)| p.clone()).collect())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(_, at)| *at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct ShopState {
    pub categories: Vec<ShopCategoryRow>,
    pub products: Vec<NewShopProduct>,
    pub next_id: i64,
    pub category_updates: usize,
}

#[derive(Default)]
pub(crate) struct FakeShop {
    pub state: Mutex<ShopState>,
}

impl FakeShop {
    pub fn with_categories(rows: Vec<ShopCategoryRow>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(ShopState {
                categories: rows,
                next_id,
                ..ShopState::default()
            }),
        }
    }

    pub fn products(&self) -> Vec<NewShopProduct> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn categories(&self) -> Vec<ShopCategoryRow> {
        self.state.lock().unwrap().categories.clone()
    }

    pub fn category(&self, external_id: &str) -> Option<ShopCategoryRow> {
        self.categories()
            .into_iter()
            .find(|c| c.external_id == external_id)
    }

    pub fn add_product(&self, product: NewShopProduct) {
        self.state.lock().unwrap().products.push(product);
    }
}

#[async_trait]
impl ShopStore for FakeShop {
    async fn find_category(&self, external_id: &str) -> Result<Option<ShopCategoryRow>, DbError> {
        Ok(self.category(external_id))
    }

    async fn insert_category(
        &self,
        external_id: &str,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<ShopCategoryRow, DbError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let row = ShopCategoryRow {
            id: state.next_id,
            external_id: external_id.to_owned(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            parent_id,
        };
        state.categories.push(row.clone());
        Ok(row)
    }

    async fn update_category(
        &self,
        id: i64,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.category_updates += 1;
        let row = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DbError::NotFound)?;
        row.name = name.to_owned();
        row.slug = slug.to_owned();
        row.parent_id = parent_id;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<ShopCategoryRow>, DbError> {
        Ok(self.categories())
    }

    async fn category_has_products(&self, id: i64) -> Result<bool, DbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .products
            .iter()
            .any(|p| p.category_ids.contains(&id)))
    }

    async fn delete_category(&self, id: i64) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.categories.retain(|c| c.id != id);
        for row in &mut state.categories {
            if row.parent_id == Some(id) {
                row.parent_id = None;
            }
        }
        Ok(())
    }

    async fn product_exists(&self, base_barcode: &str) -> Result<bool, DbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .products
            .iter()
            .any(|p| p.base_barcode == base_barcode))
    }

    async fn sku_exists(&self, sku: &str) -> Result<bool, DbError> {
        Ok(self.state.lock().unwrap().products.iter().any(|p| {
            p.sku.as_deref() == Some(sku) || p.variations.iter().any(|v| v.sku == sku)
        }))
    }

    async fn create_product(&self, product: &NewShopProduct) -> Result<CreatedProduct, DbError> {
        let mut state = self.state.lock().unwrap();
        assert!(
            !state.products.iter().any(|p| p.base_barcode == product.base_barcode),
            "duplicate shop product for base {}",
            product.base_barcode
        );
        state.next_id += 1;
        let id = state.next_id;
        state.products.push(product.clone());
        Ok(CreatedProduct {
            id,
            public_id: Uuid::new_v4(),
            variation_ids: (1..=product.variations.len())
                .map(|n| id * 100 + i64::try_from(n).unwrap())
                .collect(),
        })
    }
}

/// Reachable unless listed in `broken`; records every probe.
#[derive(Default)]
pub(crate) struct FakeProbe {
    pub broken: HashSet<String>,
    pub probed: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn with_broken<const N: usize>(urls: [&str; N]) -> Self {
        Self {
            broken: urls.iter().map(|u| (*u).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageProbe for FakeProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_owned());
        !self.broken.contains(url)
    }
}

pub(crate) fn options() -> SyncOptions {
    SyncOptions {
        max_pages: 50,
        inter_request_delay_ms: 0,
        variation_attribute: "ზომა".to_owned(),
        require_category: false,
        dry_run: false,
    }
}

pub(crate) async fn run_with(
    source: &FakeSource,
    staging: &FakeStaging,
    shop: &FakeShop,
    probe: &FakeProbe,
    options: SyncOptions,
    phase: SyncPhase,
) -> Result<SyncReport, SyncError> {
    Syncer::new(source, staging, shop, probe, options).run(phase).await
}

/// A valid upstream product record as the API serves it.
pub(crate) fn item(sku: &str, barcode: &str, category_id: &str) -> Value {
    json!({
        "productId": format!("p-{sku}"),
        "categoryId": category_id,
        "name": format!("Item {sku}"),
        "sku": sku,
        "barcode": barcode,
        "originalPrice": 10,
        "stockQuantity": 2,
        "imageUrl": format!("https://cdn.test/{sku}.jpg")
    })
}

/// A staged record with one main image and no gallery or attributes.
pub(crate) fn staged(sku: &str, barcode: &str, category_id: &str) -> NormalizedProduct {
    NormalizedProduct {
        product_id: format!("p-{sku}"),
        category_id: category_id.to_owned(),
        name: format!("Item {sku}"),
        description: String::new(),
        sku: sku.to_owned(),
        barcode: barcode.to_owned(),
        stock: 2,
        price: dec!(10),
        sale_price: dec!(8),
        b2b_price: dec!(7),
        main_image: format!("https://cdn.test/{sku}.jpg"),
        images: Vec::new(),
        attributes: Vec::new(),
        model: String::new(),
    }
}

pub(crate) fn with_attribute(mut record: NormalizedProduct, name: &str, value: &str) -> NormalizedProduct {
    record.attributes.push(ProductAttribute {
        name: name.to_owned(),
        value: value.to_owned(),
        slug: a24_core::to_slug(name),
    });
    record
}

pub(crate) fn category_row(id: i64, external_id: &str, name: &str, parent_id: Option<i64>) -> ShopCategoryRow {
    ShopCategoryRow {
        id,
        external_id: external_id.to_owned(),
        name: name.to_owned(),
        slug: a24_core::to_slug(name),
        parent_id,
    }
}
