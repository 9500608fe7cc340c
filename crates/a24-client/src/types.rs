//! API24 response types.
//!
//! The API is loose about JSON types: prices arrive as numbers or numeric
//! strings, ids as numbers or strings, and list fields may be `null`. Every
//! field is therefore optional and decoded leniently here, once, so that
//! nothing past [`crate::normalize`] sees the untyped shape. A value that
//! cannot be interpreted decodes as `None` instead of failing the page.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One entry of `GET /basedata/categories`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api24Category {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parent_id: Option<String>,
}

impl Api24Category {
    /// Converts to a core [`a24_core::Category`]; entries without an id are dropped.
    #[must_use]
    pub fn into_category(self) -> Option<a24_core::Category> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let name = self.name.unwrap_or_default();
        Some(a24_core::Category::new(id, name, self.parent_id))
    }
}

/// One entry of `GET /products?page=N`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api24Product {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub stock_quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub original_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sale_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub b2b_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Option<Vec<Api24GalleryImage>>,
    #[serde(default)]
    pub attributes: Option<Vec<Api24Attribute>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model_no: Option<String>,
}

/// A gallery entry; only the full-size `big` URL is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api24GalleryImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub big: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub small: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api24Attribute {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(&s),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_f64))
        }
        _ => None,
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_f64(v: f64) -> Option<i64> {
    // Out-of-range and NaN stock counts are treated as unknown.
    (v.is_finite() && v.abs() < 9.0e15).then(|| v.trunc() as i64)
}
