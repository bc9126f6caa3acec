mod support;

use assert_matches::assert_matches;
use corner_store::catalog::CatalogService;
use corner_store::model::RecordId;
use corner_store::repository::PRODUCT_COLLECTION;
use corner_store::store::{
    self, DocumentStore, Filter, FindOptions, MemoryStore, Projection, SortSpec, StoreError,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use support::{category_fields, product_fields};
use tempfile::tempdir;

#[tokio::test]
async fn file_store_survives_reopen() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let target = format!("file://{}", path.display());

    // Act: write through one connection, read through another
    let first = store::connect(&target).await.unwrap();
    let catalog = CatalogService::new(first.clone());
    let dairy = catalog.create_category(category_fields("Dairy")).await.unwrap();
    let milk = catalog
        .create_product(product_fields("Milk", 2.5, dairy.id))
        .await
        .unwrap();
    first.close().await.unwrap();
    assert!(path.exists());

    let second = store::connect(path.to_str().unwrap()).await.unwrap();
    let catalog = CatalogService::new(second);

    // Assert
    assert_eq!(catalog.find_category(dairy.id).await.unwrap(), Some(dairy));
    let detail = catalog.product_detail(milk.id).await.unwrap().unwrap();
    assert_eq!(detail.product, milk);
}

#[tokio::test]
async fn every_mutation_is_persisted_before_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    let store = MemoryStore::open(path.clone()).await.unwrap();
    let id = store
        .insert("categories", json!({"name": "Fruit"}).as_object().unwrap().clone())
        .await
        .unwrap();

    let reopened = MemoryStore::open(path).await.unwrap();
    let doc = reopened.find_by_id("categories", id).await.unwrap().unwrap();
    assert_eq!(doc["name"], "Fruit");
}

#[tokio::test]
async fn failed_snapshot_write_leaves_memory_unchanged() {
    // Arrange: the snapshot directory is a regular file, so no write can land
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let store = MemoryStore::open(blocker.join("catalog.json")).await.unwrap();

    // Act
    let inserted = store
        .insert("categories", json!({"name": "Fruit"}).as_object().unwrap().clone())
        .await;

    // Assert
    assert_matches!(inserted, Err(StoreError::Io { .. }));
    assert_eq!(store.count("categories", &Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_replace_and_delete_keep_the_stored_document() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let store = MemoryStore::open(data.join("catalog.json")).await.unwrap();
    let id = store
        .insert("categories", json!({"name": "Fruit"}).as_object().unwrap().clone())
        .await
        .unwrap();

    // Later writes fail: the snapshot directory turns into a file
    std::fs::remove_dir_all(&data).unwrap();
    std::fs::write(&data, b"").unwrap();

    let replaced = store
        .replace("categories", id, json!({"name": "Veg"}).as_object().unwrap().clone())
        .await;
    assert_matches!(replaced, Err(StoreError::Io { .. }));
    let deleted = store.delete("categories", id).await;
    assert_matches!(deleted, Err(StoreError::Io { .. }));

    let doc = store.find_by_id("categories", id).await.unwrap().unwrap();
    assert_eq!(doc["name"], "Fruit");
    assert_eq!(store.count("categories", &Filter::all()).await.unwrap(), 1);

    // A miss changes nothing and writes nothing
    assert!(!store.delete("categories", RecordId::generate()).await.unwrap());
}

#[tokio::test]
async fn corrupt_snapshot_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, b"{not json").unwrap();

    let error = MemoryStore::open(path).await.err();
    assert_matches!(error, Some(StoreError::Snapshot(_)));
}

#[tokio::test]
async fn closed_store_fails_every_operation() {
    let store = MemoryStore::new();
    store.close().await.unwrap();

    assert_matches!(store.ping().await, Err(StoreError::Closed));
    assert_matches!(
        store.count("categories", &Filter::all()).await,
        Err(StoreError::Closed)
    );
}

#[tokio::test]
async fn category_detail_projection_drops_other_fields() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store.clone());
    let dairy = catalog.create_category(category_fields("Dairy")).await.unwrap();
    catalog
        .create_product(product_fields("Milk", 2.5, dairy.id))
        .await
        .unwrap();

    let options = FindOptions::new().project(Projection::fields(["name", "price"]));
    let docs = store
        .find(PRODUCT_COLLECTION, &Filter::all(), &options)
        .await
        .unwrap();
    let mut keys: Vec<&str> = docs[0].keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["_id", "name", "price"]);

    let detail = catalog.category_detail(dairy.id).await.unwrap().unwrap();
    assert_eq!(detail.products.len(), 1);
    assert_eq!(detail.products[0].name, "Milk");
    assert_eq!(detail.products[0].price, 2.5);
}

#[tokio::test]
async fn string_sort_is_binary() {
    let store = MemoryStore::new();
    for name in ["banana", "Cherry", "apple"] {
        store
            .insert("fruit", json!({ "name": name }).as_object().unwrap().clone())
            .await
            .unwrap();
    }

    let docs = store
        .find(
            "fruit",
            &Filter::all(),
            &FindOptions::new().sort(SortSpec::ascending("name")),
        )
        .await
        .unwrap();
    let names: Vec<&str> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Cherry", "apple", "banana"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn product_list_is_sorted_for_any_insert_order(
        names in proptest::collection::vec("[A-Z][a-z]{0,8}", 1..8)
            .prop_shuffle()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let listed = runtime.block_on(async {
            let catalog = CatalogService::new(Arc::new(MemoryStore::new()));
            let fruit = catalog.create_category(category_fields("Fruit")).await.unwrap();
            for name in &names {
                catalog
                    .create_product(product_fields(name, 1.0, fruit.id))
                    .await
                    .unwrap();
            }
            catalog.product_list().await.unwrap()
        });

        let mut expected = names.clone();
        expected.sort();
        let listed: Vec<String> = listed.into_iter().map(|row| row.name).collect();
        prop_assert_eq!(listed, expected);
    }
}
