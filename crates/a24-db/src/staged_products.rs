//! Database operations for the `staged_products` staging table.

use a24_core::{NormalizedProduct, ProductAttribute};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

const STAGED_COLUMNS: &str = "product_id, category_id, name, description, sku, barcode, stock, \
     price, sale_price, b2b_price, main_image, images, attributes, model";

/// A row from `staged_products`, minus bookkeeping columns.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StagedProductRow {
    product_id: String,
    category_id: String,
    name: String,
    description: String,
    sku: String,
    barcode: String,
    stock: i64,
    price: Decimal,
    sale_price: Decimal,
    b2b_price: Decimal,
    main_image: String,
    images: Json<Vec<String>>,
    attributes: Json<Vec<ProductAttribute>>,
    model: String,
}

impl From<StagedProductRow> for NormalizedProduct {
    fn from(row: StagedProductRow) -> Self {
        NormalizedProduct {
            product_id: row.product_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            sku: row.sku,
            barcode: row.barcode,
            stock: row.stock,
            price: row.price,
            sale_price: row.sale_price,
            b2b_price: row.b2b_price,
            main_image: row.main_image,
            images: row.images.0,
            attributes: row.attributes.0,
            model: row.model,
        }
    }
}

/// Inserts or refreshes the staged row for `product.sku`.
///
/// `synced_at` becomes the row's `updated_at`; cleanup later deletes rows
/// whose stamp predates the current products pass.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_staged_product(
    pool: &PgPool,
    product: &NormalizedProduct,
    synced_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO staged_products \
             (product_id, category_id, name, description, sku, barcode, stock, \
              price, sale_price, b2b_price, main_image, images, attributes, model, \
              created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) \
         ON CONFLICT (sku) DO UPDATE SET \
             product_id  = EXCLUDED.product_id, \
             category_id = EXCLUDED.category_id, \
             name        = EXCLUDED.name, \
             description = EXCLUDED.description, \
             barcode     = EXCLUDED.barcode, \
             stock       = EXCLUDED.stock, \
             price       = EXCLUDED.price, \
             sale_price  = EXCLUDED.sale_price, \
             b2b_price   = EXCLUDED.b2b_price, \
             main_image  = EXCLUDED.main_image, \
             images      = EXCLUDED.images, \
             attributes  = EXCLUDED.attributes, \
             model       = EXCLUDED.model, \
             updated_at  = EXCLUDED.updated_at",
    )
    .bind(&product.product_id)
    .bind(&product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.sku)
    .bind(&product.barcode)
    .bind(product.stock)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(product.b2b_price)
    .bind(&product.main_image)
    .bind(Json(&product.images))
    .bind(Json(&product.attributes))
    .bind(&product.model)
    .bind(synced_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns every staged product in staging order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_staged_products(pool: &PgPool) -> Result<Vec<NormalizedProduct>, DbError> {
    let rows = sqlx::query_as::<_, StagedProductRow>(&format!(
        "SELECT {STAGED_COLUMNS} FROM staged_products ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NormalizedProduct::from).collect())
}

/// Staged products whose barcode equals `barcode` exactly.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_staged_by_barcode(
    pool: &PgPool,
    barcode: &str,
) -> Result<Vec<NormalizedProduct>, DbError> {
    let rows = sqlx::query_as::<_, StagedProductRow>(&format!(
        "SELECT {STAGED_COLUMNS} FROM staged_products WHERE barcode = $1 ORDER BY id"
    ))
    .bind(barcode)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NormalizedProduct::from).collect())
}

/// Staged products whose barcode is `base` followed by `_` and a suffix.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_staged_by_barcode_prefix(
    pool: &PgPool,
    base: &str,
) -> Result<Vec<NormalizedProduct>, DbError> {
    let rows = sqlx::query_as::<_, StagedProductRow>(&format!(
        "SELECT {STAGED_COLUMNS} FROM staged_products \
         WHERE barcode LIKE $1 ESCAPE '\\' ORDER BY id"
    ))
    .bind(like_prefix_pattern(base))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NormalizedProduct::from).collect())
}

/// Deletes staged rows last refreshed before `cutoff`. Returns the count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_stale_staged_products(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM staged_products WHERE updated_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_staged_products(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staged_products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// `LIKE` pattern matching `base_<anything>`, with `base` taken literally.
#[must_use]
pub fn like_prefix_pattern(base: &str) -> String {
    let mut pattern = String::with_capacity(base.len() + 3);
    for ch in base.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push_str("\\_%");
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pattern_escapes_wildcards() {
        assert_eq!(like_prefix_pattern("4860001"), "4860001\\_%");
        assert_eq!(like_prefix_pattern("50%"), "50\\%\\_%");
        assert_eq!(like_prefix_pattern("a\\b"), "a\\\\b\\_%");
    }

    #[test]
    fn prefix_pattern_of_empty_base_still_requires_separator() {
        assert_eq!(like_prefix_pattern(""), "\\_%");
    }
}
