use super::{Fields, object};
use crate::model::{Product, ProductFields, ProductSummary, RecordId};
use crate::store::{Document, DocumentStore, Filter, FindOptions, Projection, SortSpec, StoreResult};
use serde_json::json;
use std::sync::Arc;

pub const PRODUCT_COLLECTION: &str = "products";

/// Projected product list row, before the category reference is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductListRow {
    pub id: RecordId,
    pub name: String,
    pub price: f64,
    pub category: RecordId,
}

#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, fields: ProductFields) -> StoreResult<Product> {
        let id = self
            .store
            .insert(PRODUCT_COLLECTION, encode(&fields))
            .await?;
        Ok(Product::from_fields(id, fields))
    }

    pub async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<Product>> {
        self.store
            .find_by_id(PRODUCT_COLLECTION, id)
            .await?
            .map(|doc| decode(&doc))
            .transpose()
    }

    /// Name, category and price of every product, ascending by name.
    pub async fn list_rows(&self) -> StoreResult<Vec<ProductListRow>> {
        let options = FindOptions::new()
            .project(Projection::fields(["name", "category", "price"]))
            .sort(SortSpec::ascending("name"));
        self.store
            .find(PRODUCT_COLLECTION, &Filter::all(), &options)
            .await?
            .iter()
            .map(|doc| {
                let fields = Fields::new(PRODUCT_COLLECTION, doc);
                Ok(ProductListRow {
                    id: fields.id()?,
                    name: fields.text("name")?,
                    price: fields.number("price")?,
                    category: fields.record_id("category")?,
                })
            })
            .collect()
    }

    /// Name and price of the products referencing `category`.
    pub async fn summaries_in_category(
        &self,
        category: RecordId,
    ) -> StoreResult<Vec<ProductSummary>> {
        let options = FindOptions::new().project(Projection::fields(["name", "price"]));
        self.store
            .find(PRODUCT_COLLECTION, &by_category(category), &options)
            .await?
            .iter()
            .map(|doc| {
                let fields = Fields::new(PRODUCT_COLLECTION, doc);
                Ok(ProductSummary {
                    id: fields.id()?,
                    name: fields.text("name")?,
                    price: fields.number("price")?,
                })
            })
            .collect()
    }

    /// Full records of the products referencing `category`.
    pub async fn in_category(&self, category: RecordId) -> StoreResult<Vec<Product>> {
        self.store
            .find(PRODUCT_COLLECTION, &by_category(category), &FindOptions::new())
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.store.count(PRODUCT_COLLECTION, &Filter::all()).await
    }

    /// Full replace; `None` when no product has this id.
    pub async fn replace(&self, id: RecordId, fields: ProductFields) -> StoreResult<Option<Product>> {
        let replaced = self
            .store
            .replace(PRODUCT_COLLECTION, id, encode(&fields))
            .await?;
        Ok(replaced.then(|| Product::from_fields(id, fields)))
    }

    pub async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        self.store.delete(PRODUCT_COLLECTION, id).await
    }
}

fn by_category(category: RecordId) -> Filter {
    Filter::all().eq("category", category.to_string())
}

fn encode(fields: &ProductFields) -> Document {
    object(json!({
        "name": fields.name,
        "price": fields.price,
        "description": fields.description,
        "image": fields.image,
        "stock": fields.stock,
        "category": fields.category.to_string(),
    }))
}

fn decode(document: &Document) -> StoreResult<Product> {
    let fields = Fields::new(PRODUCT_COLLECTION, document);
    Ok(Product {
        id: fields.id()?,
        name: fields.text("name")?,
        price: fields.number("price")?,
        description: fields.text("description")?,
        image: fields.text("image")?,
        stock: fields.count("stock")?,
        category: fields.record_id("category")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn fields(name: &str, category: RecordId) -> ProductFields {
        ProductFields {
            name: name.into(),
            price: 1.25,
            description: "desc".into(),
            image: "img.png".into(),
            stock: 3,
            category,
        }
    }

    #[tokio::test]
    async fn summaries_only_cover_the_category() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        let dairy = RecordId::generate();
        let fruit = RecordId::generate();
        let milk = repo.create(fields("Milk", dairy)).await.unwrap();
        repo.create(fields("Apple", fruit)).await.unwrap();

        let summaries = repo.summaries_in_category(dairy).await.unwrap();
        assert_eq!(
            summaries,
            vec![ProductSummary {
                id: milk.id,
                name: "Milk".into(),
                price: 1.25,
            }]
        );
        assert_eq!(repo.in_category(dairy).await.unwrap(), vec![milk]);
    }

    #[tokio::test]
    async fn list_rows_are_sorted_by_name() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        let category = RecordId::generate();
        for name in ["Zebra", "Apple", "Mango"] {
            repo.create(fields(name, category)).await.unwrap();
        }
        let names: Vec<_> = repo
            .list_rows()
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.name)
            .collect();
        assert_eq!(names, ["Apple", "Mango", "Zebra"]);
    }
}
