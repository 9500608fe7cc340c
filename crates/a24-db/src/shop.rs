//! Database operations for the shop-side catalog: categories, products,
//! variations, attributes and media.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

/// A row from `shop_categories`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShopCategoryRow {
    pub id: i64,
    /// The API24 category id this term mirrors.
    pub external_id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Simple,
    Variable,
}

impl ProductType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Variable => "variable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductAttribute {
    pub name: String,
    pub slug: String,
    pub options: Vec<String>,
    /// Marks the axis variations are distinguished by.
    pub is_variation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShopVariation {
    pub sku: String,
    pub barcode: String,
    /// Value of the variation-axis attribute, e.g. `XL`.
    pub attribute_value: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub b2b_price: Decimal,
    pub stock: i64,
    pub image_url: Option<String>,
}

/// Everything needed to create one shop product in a single transaction.
///
/// Simple products carry `sku`, prices and stock directly; variable products
/// leave those `None` and list their [`NewShopVariation`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShopProduct {
    pub base_barcode: String,
    pub product_type: ProductType,
    pub sku: Option<String>,
    pub external_product_id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub model: String,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub b2b_price: Option<Decimal>,
    pub stock: Option<i64>,
    /// Shop category ids, root first.
    pub category_ids: Vec<i64>,
    pub attributes: Vec<NewProductAttribute>,
    /// Featured image.
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    pub variations: Vec<NewShopVariation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: i64,
    pub public_id: Uuid,
    pub variation_ids: Vec<i64>,
}

// ---------------------------------------------------------------------------
// shop_categories operations
// ---------------------------------------------------------------------------

/// Looks up the term mirroring API24 category `external_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_shop_category(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<ShopCategoryRow>, DbError> {
    let row = sqlx::query_as::<_, ShopCategoryRow>(
        "SELECT id, external_id, name, slug, parent_id \
         FROM shop_categories WHERE external_id = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shop_categories(pool: &PgPool) -> Result<Vec<ShopCategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopCategoryRow>(
        "SELECT id, external_id, name, slug, parent_id FROM shop_categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Inserts a new category term and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation when a concurrent sync created the same `external_id`.
pub async fn insert_shop_category(
    pool: &PgPool,
    external_id: &str,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
) -> Result<ShopCategoryRow, DbError> {
    let row = sqlx::query_as::<_, ShopCategoryRow>(
        "INSERT INTO shop_categories (external_id, name, slug, parent_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, external_id, name, slug, parent_id",
    )
    .bind(external_id)
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Rewrites name, slug and parent of an existing term.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no term has `id`, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_shop_category(
    pool: &PgPool,
    id: i64,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE shop_categories \
         SET name = $1, slug = $2, parent_id = $3, updated_at = NOW() \
         WHERE id = $4",
    )
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn shop_category_has_products(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM shop_product_categories WHERE category_id = $1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Deletes a term; child terms are detached by the `ON DELETE SET NULL` parent key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_shop_category(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM shop_categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// shop_products operations
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn shop_product_exists_for_barcode(
    pool: &PgPool,
    base_barcode: &str,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM shop_products WHERE base_barcode = $1)",
    )
    .bind(base_barcode)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// True if `sku` is taken by a product or a variation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sku_exists(pool: &PgPool, sku: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM shop_products WHERE sku = $1) \
             OR EXISTS (SELECT 1 FROM shop_variations WHERE sku = $1)",
    )
    .bind(sku)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_shop_products(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop_products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Creates a product with its categories, attributes, images and variations.
///
/// Runs in one transaction so a failure leaves no partial product behind.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any failed statement. A concurrent sync that
/// won the race surfaces as a unique violation on `base_barcode` or a SKU;
/// see [`DbError::is_unique_violation`].
pub async fn create_shop_product(
    pool: &PgPool,
    product: &NewShopProduct,
) -> Result<CreatedProduct, DbError> {
    let mut tx = pool.begin().await?;
    let public_id = Uuid::new_v4();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shop_products \
             (public_id, base_barcode, product_type, sku, external_product_id, name, slug, \
              description, model, price, sale_price, b2b_price, stock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING id",
    )
    .bind(public_id)
    .bind(&product.base_barcode)
    .bind(product.product_type.as_str())
    .bind(product.sku.as_deref())
    .bind(&product.external_product_id)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(&product.model)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(product.b2b_price)
    .bind(product.stock)
    .fetch_one(&mut *tx)
    .await?;

    for (position, category_id) in (0i32..).zip(&product.category_ids) {
        sqlx::query(
            "INSERT INTO shop_product_categories (product_id, category_id, position) \
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(category_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;
    }

    for (position, attribute) in (0i32..).zip(&product.attributes) {
        sqlx::query(
            "INSERT INTO shop_product_attributes \
                 (product_id, name, slug, options, is_variation, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&attribute.name)
        .bind(&attribute.slug)
        .bind(&attribute.options)
        .bind(attribute.is_variation)
        .bind(position)
        .execute(&mut *tx)
        .await?;
    }

    let images = product.image_url.iter().chain(&product.gallery);
    for (position, url) in (0i32..).zip(images) {
        attach_image(&mut tx, id, None, url, position).await?;
    }

    let mut variation_ids = Vec::with_capacity(product.variations.len());
    for (position, variation) in (0i32..).zip(&product.variations) {
        let variation_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO shop_variations \
                 (product_id, sku, barcode, attribute_value, price, sale_price, b2b_price, \
                  stock, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(id)
        .bind(&variation.sku)
        .bind(&variation.barcode)
        .bind(&variation.attribute_value)
        .bind(variation.price)
        .bind(variation.sale_price)
        .bind(variation.b2b_price)
        .bind(variation.stock)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(url) = &variation.image_url {
            attach_image(&mut tx, id, Some(variation_id), url, 0).await?;
        }
        variation_ids.push(variation_id);
    }

    tx.commit().await?;

    Ok(CreatedProduct {
        id,
        public_id,
        variation_ids,
    })
}

/// Records `url` in `shop_media` (once per URL) and links it at `position`.
async fn attach_image(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    variation_id: Option<i64>,
    url: &str,
    position: i32,
) -> Result<(), DbError> {
    let media_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shop_media (url) VALUES ($1) \
         ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url \
         RETURNING id",
    )
    .bind(url)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO shop_product_images (product_id, variation_id, media_id, position) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(product_id)
    .bind(variation_id)
    .bind(media_id)
    .bind(position)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
