//! Normalization from raw [`Api24Product`] records to [`a24_core::NormalizedProduct`].
//!
//! A record is either fully populated or rejected; staging never sees a
//! partial product.

use a24_core::{to_slug, NormalizedProduct, ProductAttribute, COLOR_ATTRIBUTE_NAME, COLOR_ATTRIBUTE_SLUG};
use rust_decimal::Decimal;

use crate::error::NormalizeError;
use crate::types::{Api24Attribute, Api24GalleryImage, Api24Product};

/// Validates and defaults one raw product.
///
/// # Errors
///
/// Returns a [`NormalizeError`] naming the first rule the record fails:
/// a missing or non-positive `originalPrice`, a blank `name` or `barcode`,
/// or a blank identity field (`productId`, `categoryId`, `sku`, `imageUrl`).
pub fn normalize_product(raw: Api24Product) -> Result<NormalizedProduct, NormalizeError> {
    let price = raw.original_price.ok_or(NormalizeError::MissingPrice)?;
    if price <= Decimal::ZERO {
        return Err(NormalizeError::NonPositivePrice(price.to_string()));
    }

    let name = non_empty(raw.name).ok_or(NormalizeError::MissingName)?;
    let barcode = non_empty(raw.barcode).ok_or(NormalizeError::MissingBarcode)?;
    let product_id = non_empty(raw.product_id).ok_or(NormalizeError::MissingField("productId"))?;
    let category_id =
        non_empty(raw.category_id).ok_or(NormalizeError::MissingField("categoryId"))?;
    let sku = non_empty(raw.sku).ok_or(NormalizeError::MissingField("sku"))?;
    let main_image = non_empty(raw.image_url).ok_or(NormalizeError::MissingField("imageUrl"))?;

    let mut attributes = normalize_attributes(raw.attributes.unwrap_or_default());
    if let Some(color) = non_empty(raw.color) {
        attributes.push(ProductAttribute {
            name: COLOR_ATTRIBUTE_NAME.to_owned(),
            value: color,
            slug: COLOR_ATTRIBUTE_SLUG.to_owned(),
        });
    }

    Ok(NormalizedProduct {
        product_id,
        category_id,
        name,
        description: raw.description.unwrap_or_default(),
        sku,
        barcode,
        stock: raw.stock_quantity.unwrap_or(0),
        price,
        sale_price: positive_or(raw.sale_price, price),
        b2b_price: positive_or(raw.b2b_price, price),
        main_image,
        images: gallery_urls(raw.gallery.unwrap_or_default()),
        attributes,
        model: raw.model_no.unwrap_or_default(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn positive_or(value: Option<Decimal>, fallback: Decimal) -> Decimal {
    value.filter(|v| *v > Decimal::ZERO).unwrap_or(fallback)
}

fn gallery_urls(gallery: Vec<Api24GalleryImage>) -> Vec<String> {
    gallery
        .into_iter()
        .filter_map(|image| non_empty(image.big))
        .collect()
}

fn normalize_attributes(raw: Vec<Api24Attribute>) -> Vec<ProductAttribute> {
    raw.into_iter()
        .filter_map(|attr| {
            let name = non_empty(attr.name)?;
            let value = non_empty(attr.value)?;
            let slug = to_slug(&name);
            Some(ProductAttribute { name, value, slug })
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
