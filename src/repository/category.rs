use super::{Fields, object};
use crate::model::{Category, CategoryFields, RecordId};
use crate::store::{
    Document, DocumentStore, Filter, FindOptions, ID_FIELD, SortSpec, StoreResult,
};
use serde_json::json;
use std::sync::Arc;

pub const CATEGORY_COLLECTION: &str = "categories";

#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn DocumentStore>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, fields: CategoryFields) -> StoreResult<Category> {
        let id = self
            .store
            .insert(CATEGORY_COLLECTION, encode(&fields))
            .await?;
        Ok(Category::from_fields(id, fields))
    }

    pub async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<Category>> {
        self.store
            .find_by_id(CATEGORY_COLLECTION, id)
            .await?
            .map(|doc| decode(&doc))
            .transpose()
    }

    /// All categories, ascending by name.
    pub async fn list_by_name(&self) -> StoreResult<Vec<Category>> {
        let options = FindOptions::new().sort(SortSpec::ascending("name"));
        self.store
            .find(CATEGORY_COLLECTION, &Filter::all(), &options)
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    /// Categories whose id is in `ids`; unknown ids are skipped.
    pub async fn find_many(&self, ids: &[RecordId]) -> StoreResult<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::all().any_of(ID_FIELD, ids.iter().map(RecordId::to_string));
        self.store
            .find(CATEGORY_COLLECTION, &filter, &FindOptions::new())
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.store.count(CATEGORY_COLLECTION, &Filter::all()).await
    }

    /// Full replace; `None` when no category has this id.
    pub async fn replace(
        &self,
        id: RecordId,
        fields: CategoryFields,
    ) -> StoreResult<Option<Category>> {
        let replaced = self
            .store
            .replace(CATEGORY_COLLECTION, id, encode(&fields))
            .await?;
        Ok(replaced.then(|| Category::from_fields(id, fields)))
    }

    pub async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        self.store.delete(CATEGORY_COLLECTION, id).await
    }
}

fn encode(fields: &CategoryFields) -> Document {
    object(json!({
        "name": fields.name,
        "description": fields.description,
        "image": fields.image,
    }))
}

fn decode(document: &Document) -> StoreResult<Category> {
    let fields = Fields::new(CATEGORY_COLLECTION, document);
    Ok(Category {
        id: fields.id()?,
        name: fields.text("name")?,
        description: fields.text("description")?,
        image: fields.text("image")?,
    })
}
