use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display name of the attribute synthesised from API24's top-level `color` field.
pub const COLOR_ATTRIBUTE_NAME: &str = "ფერი";
/// Fixed slug of the synthesised color attribute.
pub const COLOR_ATTRIBUTE_SLUG: &str = "color";

/// One named attribute on a product, e.g. `ზომა = XL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
    pub slug: String,
}

/// An API24 product after validation and defaulting, ready for staging.
///
/// Every field is populated; records that cannot satisfy that are rejected
/// during normalization rather than stored partially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub product_id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    /// Staging key; one staged row per SKU.
    pub sku: String,
    /// Either a bare base barcode or `base_<suffix>` for a variation.
    pub barcode: String,
    pub stock: i64,
    pub price: Decimal,
    /// Never below zero; equals `price` when the upstream sale price is unset.
    pub sale_price: Decimal,
    pub b2b_price: Decimal,
    pub main_image: String,
    pub images: Vec<String>,
    pub attributes: Vec<ProductAttribute>,
    pub model: String,
}

impl NormalizedProduct {
    /// Looks up an attribute value by display name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&ProductAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Main image first, then the gallery, without repeats.
    #[must_use]
    pub fn image_candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.images.len() + 1);
        let main = std::iter::once(self.main_image.as_str());
        for url in main.chain(self.images.iter().map(String::as_str)) {
            if !url.is_empty() && !out.contains(&url) {
                out.push(url);
            }
        }
        out
    }
}
