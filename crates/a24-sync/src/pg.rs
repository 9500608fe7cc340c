//! Postgres-backed [`StagingStore`] and [`ShopStore`].

use a24_core::NormalizedProduct;
use a24_db::{CreatedProduct, DbError, NewShopProduct, ShopCategoryRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::ports::{ShopStore, StagingStore};

#[derive(Clone)]
pub struct PgStaging {
    pool: PgPool,
}

impl PgStaging {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StagingStore for PgStaging {
    async fn upsert(
        &self,
        product: &NormalizedProduct,
        synced_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        a24_db::upsert_staged_product(&self.pool, product, synced_at).await
    }

    async fn list_all(&self) -> Result<Vec<NormalizedProduct>, DbError> {
        a24_db::list_staged_products(&self.pool).await
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        a24_db::delete_stale_staged_products(&self.pool, cutoff).await
    }
}

#[derive(Clone)]
pub struct PgShop {
    pool: PgPool,
}

impl PgShop {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for PgShop {
    async fn find_category(&self, external_id: &str) -> Result<Option<ShopCategoryRow>, DbError> {
        a24_db::find_shop_category(&self.pool, external_id).await
    }

    async fn insert_category(
        &self,
        external_id: &str,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<ShopCategoryRow, DbError> {
        a24_db::insert_shop_category(&self.pool, external_id, name, slug, parent_id).await
    }

    async fn update_category(
        &self,
        id: i64,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<(), DbError> {
        a24_db::update_shop_category(&self.pool, id, name, slug, parent_id).await
    }

    async fn list_categories(&self) -> Result<Vec<ShopCategoryRow>, DbError> {
        a24_db::list_shop_categories(&self.pool).await
    }

    async fn category_has_products(&self, id: i64) -> Result<bool, DbError> {
        a24_db::shop_category_has_products(&self.pool, id).await
    }

    async fn delete_category(&self, id: i64) -> Result<(), DbError> {
        a24_db::delete_shop_category(&self.pool, id).await
    }

    async fn product_exists(&self, base_barcode: &str) -> Result<bool, DbError> {
        a24_db::shop_product_exists_for_barcode(&self.pool, base_barcode).await
    }

    async fn sku_exists(&self, sku: &str) -> Result<bool, DbError> {
        a24_db::sku_exists(&self.pool, sku).await
    }

    async fn create_product(&self, product: &NewShopProduct) -> Result<CreatedProduct, DbError> {
        a24_db::create_shop_product(&self.pool, product).await
    }
}
