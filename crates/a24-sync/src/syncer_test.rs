use chrono::{Duration, Utc};
use serde_json::{json, Value};

use super::*;
use crate::fakes::{
    category_row, item, options, run_with, staged, FakeProbe, FakeShop, FakeSource, FakeStaging,
};
use a24_db::{NewShopProduct, ProductType};

fn legacy_product(base: &str, category_ids: Vec<i64>) -> NewShopProduct {
    NewShopProduct {
        base_barcode: base.to_owned(),
        product_type: ProductType::Simple,
        sku: Some(format!("sku-{base}")),
        external_product_id: format!("p-{base}"),
        name: format!("Legacy {base}"),
        slug: format!("legacy-{}", base.to_lowercase()),
        description: String::new(),
        model: String::new(),
        price: None,
        sale_price: None,
        b2b_price: None,
        stock: None,
        category_ids,
        attributes: Vec::new(),
        image_url: None,
        gallery: Vec::new(),
        variations: Vec::new(),
    }
}

fn pages(pages: Vec<Value>) -> FakeSource {
    FakeSource {
        categories: Some(json!([{"id": 1, "name": "Electronics"}])),
        pages,
        ..FakeSource::default()
    }
}

#[test]
fn phase_labels_match_sync_run_values() {
    let labels: Vec<_> = [
        SyncPhase::Categories,
        SyncPhase::Products,
        SyncPhase::Create,
        SyncPhase::Cleanup,
        SyncPhase::All,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(labels, ["categories", "products", "create", "cleanup", "all"]);
}

#[tokio::test]
async fn categories_are_created_parent_first() {
    let source = FakeSource::with_categories(json!([
        {"id": 2, "name": "Phones", "parentId": 1},
        {"id": 1, "name": "Electronics", "parentId": null}
    ]));
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Categories)
        .await
        .unwrap();

    let categories = report.categories.unwrap();
    assert_eq!(categories.fetched, 2);
    assert_eq!(categories.created, 2);
    assert!(report.products.is_none() && report.create.is_none() && report.cleanup.is_none());

    let root = shop.category("1").unwrap();
    let child = shop.category("2").unwrap();
    assert_eq!(root.slug, "electronics");
    assert_eq!(root.parent_id, None);
    assert_eq!(child.parent_id, Some(root.id));
    assert!(source.requested().is_empty());
}

#[tokio::test]
async fn drifted_slug_is_repaired_then_left_alone() {
    let source = FakeSource::with_categories(json!([{"id": 1, "name": "Electronics"}]));
    let shop = FakeShop::with_categories(vec![category_row(5, "1", "Old name", None)]);
    let (staging, probe) = (FakeStaging::default(), FakeProbe::default());

    let first = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Categories)
        .await
        .unwrap()
        .categories
        .unwrap();
    assert_eq!(first.updated, 1);
    assert_eq!(first.slugs_repaired, 1);
    let row = shop.category("1").unwrap();
    assert_eq!((row.id, row.name.as_str(), row.slug.as_str()), (5, "Electronics", "electronics"));

    let second = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Categories)
        .await
        .unwrap()
        .categories
        .unwrap();
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(shop.state.lock().unwrap().category_updates, 1);
}

#[tokio::test]
async fn duplicate_category_id_keeps_the_first_record() {
    let source = FakeSource::with_categories(json!([
        {"id": 1, "name": "Alpha"},
        {"id": 1, "name": "Beta"}
    ]));
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Categories)
        .await
        .unwrap()
        .categories
        .unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.duplicates, 1);
    let row = shop.category("1").unwrap();
    assert_eq!((row.name.as_str(), row.slug.as_str()), ("Alpha", "alpha"));
    assert_eq!(shop.categories().len(), 1);
}

#[tokio::test]
async fn category_fetch_failure_aborts_the_run() {
    let source = FakeSource {
        categories: None,
        pages: vec![json!([item("a", "100", "1")])],
        ..FakeSource::default()
    };
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let err = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::All)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::CategoryFetch(_)));
    assert!(source.requested().is_empty());
    assert!(staging.skus().is_empty());
}

#[tokio::test]
async fn products_page_until_empty_and_count_rejects() {
    let mut rejected = item("bad", "300", "1");
    rejected["originalPrice"] = json!(0);
    let source = pages(vec![
        json!([item("a", "100", "1"), item("b", "200_1", "1")]),
        json!([item("c", "200_2", "1"), rejected]),
        json!([]),
    ]);
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Products)
        .await
        .unwrap()
        .products
        .unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_seen, 4);
    assert_eq!(report.staged, 3);
    assert_eq!(report.rejected, 1);
    assert!(!report.page_cap_hit && !report.stopped_on_error);
    assert_eq!(source.requested(), vec![1, 2, 3]);
    assert_eq!(staging.skus(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn null_page_ends_pagination() {
    let source = pages(vec![json!([item("a", "100", "1")]), Value::Null]);
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Products)
        .await
        .unwrap()
        .products
        .unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(source.requested(), vec![1, 2]);
}

#[tokio::test]
async fn page_cap_stops_an_endless_catalog() {
    let source = FakeSource {
        endless: true,
        ..pages(vec![json!([item("a", "100", "1")])])
    };
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());
    let capped = SyncOptions {
        max_pages: 3,
        ..options()
    };

    let report = run_with(&source, &staging, &shop, &probe, capped, SyncPhase::Products)
        .await
        .unwrap()
        .products
        .unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert!(report.page_cap_hit);
    assert_eq!(source.requested(), vec![1, 2, 3]);
    // Same SKU on every page: one staged row, refreshed each time.
    assert_eq!(report.staged, 3);
    assert_eq!(staging.skus(), vec!["a"]);
}

#[tokio::test]
async fn page_error_keeps_earlier_pages() {
    let source = FakeSource {
        failing_page: Some(2),
        ..pages(vec![
            json!([item("a", "100", "1")]),
            json!([item("b", "200", "1")]),
        ])
    };
    let (staging, shop, probe) = (FakeStaging::default(), FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Products)
        .await
        .unwrap()
        .products
        .unwrap();

    assert!(report.stopped_on_error);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(staging.skus(), vec!["a"]);
}

#[tokio::test]
async fn interrupted_pagination_keeps_unseen_staged_rows() {
    let source = FakeSource {
        failing_page: Some(2),
        ..pages(vec![
            json!([item("a", "100", "1")]),
            json!([item("b", "200", "1")]),
        ])
    };
    let staging = FakeStaging::seeded(
        vec![staged("b", "200", "1")],
        Utc::now() - Duration::days(1),
    );
    let (shop, probe) = (FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::All)
        .await
        .unwrap();

    assert!(report.products.as_ref().unwrap().stopped_on_error);
    let cleanup = report.cleanup.unwrap();
    assert!(cleanup.staged_skipped);
    assert_eq!(cleanup.staged_deleted, 0);
    assert_eq!(staging.skus(), vec!["b", "a"]);
}

#[tokio::test]
async fn page_cap_keeps_unseen_staged_rows() {
    let source = FakeSource {
        endless: true,
        ..pages(vec![json!([item("a", "100", "1")])])
    };
    let staging = FakeStaging::seeded(
        vec![staged("old", "OLD", "1")],
        Utc::now() - Duration::days(1),
    );
    let (shop, probe) = (FakeShop::default(), FakeProbe::default());
    let capped = SyncOptions {
        max_pages: 2,
        ..options()
    };

    let report = run_with(&source, &staging, &shop, &probe, capped, SyncPhase::All)
        .await
        .unwrap();

    assert!(report.products.as_ref().unwrap().page_cap_hit);
    assert!(report.cleanup.unwrap().staged_skipped);
    assert!(staging.skus().contains(&"old".to_owned()));
}

#[tokio::test]
async fn all_run_prunes_stale_rows_and_orphaned_categories() {
    let source = pages(vec![json!([item("new", "N1", "1")])]);
    let staging = FakeStaging::seeded(
        vec![staged("old", "OLD", "1")],
        Utc::now() - Duration::days(1),
    );
    let shop = FakeShop::with_categories(vec![
        category_row(1, "1", "Electronics", None),
        category_row(8, "8", "Discontinued", None),
        category_row(9, "9", "Empty", Some(8)),
    ]);
    shop.add_product(legacy_product("LEGACY", vec![8]));
    let probe = FakeProbe::default();

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::All)
        .await
        .unwrap();

    // Create runs before cleanup, so the stale row still becomes a product.
    assert_eq!(report.create.as_ref().unwrap().created_simple, 2);

    let cleanup = report.cleanup.unwrap();
    assert_eq!(cleanup.staged_deleted, 1);
    assert_eq!(staging.skus(), vec!["new"]);
    assert_eq!(cleanup.categories_deleted, 1);
    assert_eq!(cleanup.categories_kept_with_products, 1);
    assert!(shop.category("9").is_none());
    assert!(shop.category("8").is_some());
    assert!(shop.category("1").is_some());
}

#[tokio::test]
async fn all_run_without_pages_keeps_staging() {
    let source = pages(Vec::new());
    let staging = FakeStaging::seeded(
        vec![staged("old", "OLD", "1")],
        Utc::now() - Duration::days(1),
    );
    let (shop, probe) = (FakeShop::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::All)
        .await
        .unwrap();

    let cleanup = report.cleanup.unwrap();
    assert!(cleanup.staged_skipped);
    assert_eq!(cleanup.staged_deleted, 0);
    assert_eq!(staging.skus(), vec!["old"]);
}

#[tokio::test]
async fn empty_category_list_keeps_shop_categories() {
    let source = FakeSource {
        categories: Some(json!([])),
        ..FakeSource::default()
    };
    let shop = FakeShop::with_categories(vec![category_row(9, "9", "Keep me", None)]);
    let (staging, probe) = (FakeStaging::default(), FakeProbe::default());

    let report = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::All)
        .await
        .unwrap();

    let cleanup = report.cleanup.unwrap();
    assert!(cleanup.categories_skipped);
    assert_eq!(cleanup.categories_deleted, 0);
    assert!(shop.category("9").is_some());
}

#[tokio::test]
async fn standalone_cleanup_has_nothing_to_act_on() {
    let source = FakeSource::default();
    let staging = FakeStaging::seeded(
        vec![staged("old", "OLD", "1")],
        Utc::now() - Duration::days(1),
    );
    let shop = FakeShop::with_categories(vec![category_row(9, "9", "Orphan", None)]);
    let probe = FakeProbe::default();

    let cleanup = run_with(&source, &staging, &shop, &probe, options(), SyncPhase::Cleanup)
        .await
        .unwrap()
        .cleanup
        .unwrap();

    assert!(cleanup.staged_skipped);
    assert!(cleanup.categories_skipped);
    assert_eq!(staging.skus(), vec!["old"]);
    assert!(shop.category("9").is_some());
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let source = pages(vec![json!([item("new", "N1", "1")])]);
    let staging = FakeStaging::seeded(
        vec![staged("old", "OLD", "1")],
        Utc::now() - Duration::days(1),
    );
    let shop = FakeShop::with_categories(vec![category_row(9, "9", "Orphan", None)]);
    let probe = FakeProbe::default();
    let dry = SyncOptions {
        dry_run: true,
        ..options()
    };

    let report = run_with(&source, &staging, &shop, &probe, dry, SyncPhase::All)
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.categories.as_ref().unwrap().created, 1);
    assert_eq!(report.products.as_ref().unwrap().staged, 1);
    assert_eq!(report.create.as_ref().unwrap().created_simple, 1);
    let cleanup = report.cleanup.as_ref().unwrap();
    assert_eq!(cleanup.staged_deleted, 1);
    assert_eq!(cleanup.categories_deleted, 1);

    assert_eq!(staging.skus(), vec!["old"]);
    assert!(shop.category("1").is_none());
    assert!(shop.category("9").is_some());
    assert!(shop.products().is_empty());
}
