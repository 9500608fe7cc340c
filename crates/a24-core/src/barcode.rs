//! Barcode-family classification of staged products.
//!
//! API24 encodes product families in the barcode: a bare `4860001` is a
//! standalone product, while `4860001_1`, `4860001_2`, ... are variations of
//! one family. Each base barcode yields at most one group, simple or
//! variable, never both.

use std::collections::{HashMap, HashSet};

use crate::products::NormalizedProduct;

/// The barcode text before the first `_`.
#[must_use]
pub fn base_barcode(barcode: &str) -> &str {
    barcode.split_once('_').map_or(barcode, |(base, _)| base)
}

/// Source of staged records for a base barcode.
pub trait BarcodeLookup {
    /// Records whose barcode is exactly `base`.
    fn exact(&self, base: &str) -> Vec<&NormalizedProduct>;
    /// Records whose barcode is `base` followed by `_` and any suffix.
    fn prefixed(&self, base: &str) -> Vec<&NormalizedProduct>;
}

/// In-memory index over the full staging table.
#[derive(Debug, Default)]
pub struct StagedIndex {
    records: Vec<NormalizedProduct>,
    by_base: HashMap<String, Vec<usize>>,
}

impl StagedIndex {
    #[must_use]
    pub fn new(records: Vec<NormalizedProduct>) -> Self {
        let mut by_base: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_base
                .entry(base_barcode(&record.barcode).to_owned())
                .or_default()
                .push(idx);
        }
        Self { records, by_base }
    }

    /// Every staged barcode, in staging order.
    pub fn barcodes(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.barcode.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn family(&self, base: &str) -> impl Iterator<Item = &NormalizedProduct> {
        self.by_base
            .get(base)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }
}

impl BarcodeLookup for StagedIndex {
    fn exact(&self, base: &str) -> Vec<&NormalizedProduct> {
        self.family(base).filter(|r| r.barcode == base).collect()
    }

    fn prefixed(&self, base: &str) -> Vec<&NormalizedProduct> {
        self.family(base)
            .filter(|r| r.barcode.len() > base.len() && r.barcode.as_bytes()[base.len()] == b'_')
            .collect()
    }
}

/// A base barcode and the staged records that will build its shop product.
#[derive(Debug, Clone)]
pub struct BarcodeGroup<'a> {
    pub base: String,
    pub records: Vec<&'a NormalizedProduct>,
}

impl<'a> BarcodeGroup<'a> {
    /// The record a simple product is created from.
    #[must_use]
    pub fn source(&self) -> Option<&'a NormalizedProduct> {
        self.records.first().copied()
    }
}

#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub simple: Vec<BarcodeGroup<'a>>,
    pub variable: Vec<BarcodeGroup<'a>>,
}

impl Classification<'_> {
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.simple.len() + self.variable.len()
    }
}

/// Partitions the base barcodes of `barcodes` into simple and variable groups.
///
/// Bases are visited in first-seen order. A bare-base record always makes the
/// base simple, even when suffixed records exist too; only bases without one
/// become variable. Bases with no matching record, or an empty base, are
/// skipped.
pub fn classify<'a, L, I, S>(barcodes: I, lookup: &'a L) -> Classification<'a>
where
    L: BarcodeLookup,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut classification = Classification::default();

    for barcode in barcodes {
        let base = base_barcode(barcode.as_ref());
        if base.is_empty() || !seen.insert(base.to_owned()) {
            continue;
        }

        let exact = lookup.exact(base);
        if !exact.is_empty() {
            if exact.len() > 1 {
                tracing::debug!(
                    base,
                    count = exact.len(),
                    "several staged records share a bare barcode; using the first"
                );
            }
            classification.simple.push(BarcodeGroup {
                base: base.to_owned(),
                records: exact,
            });
            continue;
        }

        let variations = lookup.prefixed(base);
        if !variations.is_empty() {
            classification.variable.push(BarcodeGroup {
                base: base.to_owned(),
                records: variations,
            });
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn staged(sku: &str, barcode: &str) -> NormalizedProduct {
        NormalizedProduct {
            product_id: sku.to_owned(),
            category_id: "1".to_owned(),
            name: format!("Product {sku}"),
            description: String::new(),
            sku: sku.to_owned(),
            barcode: barcode.to_owned(),
            stock: 1,
            price: dec!(10),
            sale_price: dec!(10),
            b2b_price: dec!(10),
            main_image: "https://cdn.example.ge/1.jpg".to_owned(),
            images: Vec::new(),
            attributes: Vec::new(),
            model: String::new(),
        }
    }

    #[test]
    fn base_barcode_splits_on_first_underscore() {
        assert_eq!(base_barcode("100"), "100");
        assert_eq!(base_barcode("100_1"), "100");
        assert_eq!(base_barcode("100_1_2"), "100");
        assert_eq!(base_barcode("_7"), "");
    }

    #[test]
    fn suffixed_family_without_bare_record_is_variable() {
        let index = StagedIndex::new(vec![staged("a", "100_1"), staged("b", "100_2")]);
        let result = classify(["100", "100_1", "100_2"], &index);

        assert!(result.simple.is_empty());
        assert_eq!(result.variable.len(), 1);
        assert_eq!(result.variable[0].base, "100");
        assert_eq!(result.variable[0].records.len(), 2);
    }

    #[test]
    fn bare_record_is_simple() {
        let index = StagedIndex::new(vec![staged("s", "200")]);
        let result = classify(["200"], &index);

        assert_eq!(result.simple.len(), 1);
        assert!(result.variable.is_empty());
        assert_eq!(result.simple[0].source().unwrap().sku, "s");
    }

    #[test]
    fn bare_record_wins_over_suffixed_records() {
        let index = StagedIndex::new(vec![
            staged("v1", "300_1"),
            staged("bare", "300"),
            staged("v2", "300_2"),
        ]);
        let result = classify(index.barcodes(), &index);

        assert_eq!(result.group_count(), 1);
        assert_eq!(result.simple.len(), 1);
        assert_eq!(result.simple[0].source().unwrap().sku, "bare");
    }

    #[test]
    fn first_of_several_bare_records_is_source() {
        let index = StagedIndex::new(vec![staged("first", "400"), staged("second", "400")]);
        let result = classify(index.barcodes(), &index);
        assert_eq!(result.simple.len(), 1);
        assert_eq!(result.simple[0].records.len(), 2);
        assert_eq!(result.simple[0].source().unwrap().sku, "first");
    }

    #[test]
    fn unmatched_and_empty_bases_are_skipped() {
        let index = StagedIndex::new(vec![staged("x", "500")]);
        let result = classify(["999", "_3", "", "500"], &index);
        assert_eq!(result.group_count(), 1);
        assert_eq!(result.simple[0].base, "500");
    }

    #[test]
    fn prefix_match_requires_underscore_boundary() {
        // "1000_1" shares the characters of "100" but not its family.
        let index = StagedIndex::new(vec![staged("a", "100_1"), staged("b", "1000_1")]);
        let result = classify(["100"], &index);
        assert_eq!(result.variable.len(), 1);
        assert_eq!(result.variable[0].records.len(), 1);
        assert_eq!(result.variable[0].records[0].sku, "a");
    }

    #[test]
    fn bases_are_visited_once_in_first_seen_order() {
        let index = StagedIndex::new(vec![
            staged("b1", "B_1"),
            staged("a", "A"),
            staged("b2", "B_2"),
        ]);
        let result = classify(index.barcodes(), &index);
        assert_eq!(result.variable.len(), 1);
        assert_eq!(result.simple.len(), 1);
        assert_eq!(result.variable[0].base, "B");
        assert_eq!(result.simple[0].base, "A");
    }
}
