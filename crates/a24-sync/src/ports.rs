//! Seams between the sync phases and their collaborators.

use a24_client::{Api24Category, Api24Client, Api24Product, ClientError};
use a24_core::NormalizedProduct;
use a24_db::{CreatedProduct, DbError, NewShopProduct, ShopCategoryRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Upstream catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<Api24Category>, ClientError>;
    /// One 1-based page; empty means past the end.
    async fn fetch_products_page(&self, page: u32) -> Result<Vec<Api24Product>, ClientError>;
}

/// The staging table.
#[async_trait]
pub trait StagingStore: Send + Sync {
    async fn upsert(&self, product: &NormalizedProduct, synced_at: DateTime<Utc>)
        -> Result<(), DbError>;
    async fn list_all(&self) -> Result<Vec<NormalizedProduct>, DbError>;
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError>;
}

/// The shop-side catalog.
#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn find_category(&self, external_id: &str) -> Result<Option<ShopCategoryRow>, DbError>;
    async fn insert_category(
        &self,
        external_id: &str,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<ShopCategoryRow, DbError>;
    async fn update_category(
        &self,
        id: i64,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<(), DbError>;
    async fn list_categories(&self) -> Result<Vec<ShopCategoryRow>, DbError>;
    async fn category_has_products(&self, id: i64) -> Result<bool, DbError>;
    async fn delete_category(&self, id: i64) -> Result<(), DbError>;
    async fn product_exists(&self, base_barcode: &str) -> Result<bool, DbError>;
    async fn sku_exists(&self, sku: &str) -> Result<bool, DbError>;
    async fn create_product(&self, product: &NewShopProduct) -> Result<CreatedProduct, DbError>;
}

/// Checks that an image URL can be fetched.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

#[async_trait]
impl CatalogSource for Api24Client {
    async fn fetch_categories(&self) -> Result<Vec<Api24Category>, ClientError> {
        Api24Client::fetch_categories(self).await
    }

    async fn fetch_products_page(&self, page: u32) -> Result<Vec<Api24Product>, ClientError> {
        Api24Client::fetch_products_page(self, page).await
    }
}
