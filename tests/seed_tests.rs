mod support;

use corner_store::catalog::CatalogService;
use corner_store::seed::{self, CATEGORIES, PRODUCTS};
use corner_store::store::{self, DocumentStore, MemoryStore, Operation};
use std::sync::Arc;
use support::FailingStore;
use tempfile::tempdir;

#[tokio::test]
async fn populate_creates_every_fixture() {
    // Arrange
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());

    // Act
    let report = seed::populate(store.clone()).await.unwrap();

    // Assert
    assert_eq!(report.categories.len(), CATEGORIES.len());
    assert_eq!(report.products.len(), PRODUCTS.len());
    let names: Vec<&str> = report.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["Fruit", "Baked Goods", "Vegetables", "Coffee", "Dairy", "Junk"]
    );

    let catalog = CatalogService::new(store);
    let summary = catalog.home().await;
    assert_eq!(summary.category_count, Some(6));
    assert_eq!(summary.product_count, Some(16));
}

#[tokio::test]
async fn products_reference_categories_by_position() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let report = seed::populate(store.clone()).await.unwrap();

    let catalog = CatalogService::new(store);
    let listing = catalog.product_list().await.unwrap();
    let kale = listing.iter().find(|row| row.name == "Kale").unwrap();
    assert_eq!(kale.category.as_ref(), Some(&report.categories[2]));

    let junk = &report.categories[5];
    let detail = catalog.category_detail(junk.id).await.unwrap().unwrap();
    assert!(detail.products.is_empty());
}

#[tokio::test]
async fn fixture_text_is_escaped_and_bounded() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let report = seed::populate(store).await.unwrap();

    let junk = &report.categories[5];
    assert_eq!(junk.description, "Who doesn&#x27;t like to pig out from time to time?");

    let bok_choy = report.products.iter().find(|p| p.name == "Bok Choy").unwrap();
    assert!(bok_choy.description.ends_with("..."));
    assert!(bok_choy.description.chars().count() <= 200);
}

#[tokio::test]
async fn store_failures_abort_seeding() {
    let store: Arc<dyn DocumentStore> = Arc::new(FailingStore::new(&[Operation::Insert]));

    let result = seed::populate(store).await;

    assert!(matches!(result, Err(seed::SeedError::Store(_))));
}

#[tokio::test]
async fn seeded_file_store_can_be_reopened() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("seeded.json");
    let target = target.to_str().unwrap();

    let store = store::connect(target).await.unwrap();
    seed::populate(store.clone()).await.unwrap();
    store.close().await.unwrap();

    let reopened = store::connect(target).await.unwrap();
    let summary = CatalogService::new(reopened).home().await;
    assert_eq!(summary.product_count, Some(16));
}
