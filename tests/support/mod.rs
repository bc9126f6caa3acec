#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use corner_store::build_router;
use corner_store::catalog::CatalogService;
use corner_store::config::ServerConfig;
use corner_store::model::{Category, CategoryFields, Product, ProductFields, RecordId};
use corner_store::state::AppState;
use corner_store::store::{
    Document, DocumentStore, Filter, FindOptions, MemoryStore, Operation, StoreError, StoreResult,
};
use corner_store::views::Views;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory store with the embedded templates.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<dyn DocumentStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let views = Views::embedded().expect("embedded templates compile");
        let state = Arc::new(AppState::new(
            Arc::new(ServerConfig::default()),
            store.clone(),
            views,
        ));
        Self { state, store }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn catalog(&self) -> &CatalogService {
        self.state.catalog()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.expect("infallible");
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn seed_category(&self, name: &str) -> Category {
        self.catalog()
            .create_category(category_fields(name))
            .await
            .expect("create category")
    }

    pub async fn seed_product(&self, name: &str, price: f64, category: RecordId) -> Product {
        self.catalog()
            .create_product(product_fields(name, price, category))
            .await
            .expect("create product")
    }
}

pub fn category_fields(name: &str) -> CategoryFields {
    CategoryFields {
        name: name.to_string(),
        description: format!("All about {name}"),
        image: format!("{}.png", name.to_lowercase()),
    }
}

pub fn product_fields(name: &str, price: f64, category: RecordId) -> ProductFields {
    ProductFields {
        name: name.to_string(),
        price,
        description: format!("Fresh {name}"),
        image: format!("{}.png", name.to_lowercase()),
        stock: 10,
        category,
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn assert_redirect_to(&self, path: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(path));
    }

    /// Id of the record a create redirect points at.
    pub fn redirected_id(&self) -> RecordId {
        let location = self.location.as_deref().expect("redirect location");
        let raw = location.rsplit('/').next().expect("id segment");
        RecordId::parse(raw).expect("record id")
    }
}

/// Memory store whose listed operations always fail. Pings never succeed.
pub struct FailingStore {
    inner: MemoryStore,
    failing: Vec<Operation>,
}

impl FailingStore {
    pub fn new(failing: &[Operation]) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: failing.to_vec(),
        }
    }

    fn check(&self, collection: &str, operation: Operation) -> StoreResult<()> {
        if self.failing.contains(&operation) {
            Err(StoreError::Corrupt {
                collection: collection.to_string(),
                reason: format!("injected {operation} failure"),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<RecordId> {
        self.check(collection, Operation::Insert)?;
        self.inner.insert(collection, document).await
    }

    async fn find_by_id(&self, collection: &str, id: RecordId) -> StoreResult<Option<Document>> {
        self.check(collection, Operation::FindById)?;
        self.inner.find_by_id(collection, id).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        self.check(collection, Operation::Find)?;
        self.inner.find(collection, filter, options).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.check(collection, Operation::Count)?;
        self.inner.count(collection, filter).await
    }

    async fn replace(
        &self,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> StoreResult<bool> {
        self.check(collection, Operation::Replace)?;
        self.inner.replace(collection, id, document).await
    }

    async fn delete(&self, collection: &str, id: RecordId) -> StoreResult<bool> {
        self.check(collection, Operation::Delete)?;
        self.inner.delete(collection, id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Closed)
    }

    async fn close(&self) -> StoreResult<()> {
        self.inner.close().await
    }
}
