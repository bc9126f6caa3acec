//! Typed CRUD per entity over a shared [`DocumentStore`].
//!
//! This is the only layer that knows the persisted record layout:
//!
//! - `categories`: `{_id, name, description, image}`
//! - `products`: `{_id, name, price, description, image, stock, category}`,
//!   where `category` holds a category id.

mod category;
mod product;

pub use category::{CATEGORY_COLLECTION, CategoryRepository};
pub use product::{PRODUCT_COLLECTION, ProductListRow, ProductRepository};

use crate::model::RecordId;
use crate::store::{Document, ID_FIELD, StoreError, StoreResult};
use serde_json::Value;

/// Field accessors that turn a malformed document into [`StoreError::Corrupt`].
struct Fields<'a> {
    collection: &'static str,
    document: &'a Document,
}

impl<'a> Fields<'a> {
    fn new(collection: &'static str, document: &'a Document) -> Self {
        Self {
            collection,
            document,
        }
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            collection: self.collection.to_string(),
            reason,
        }
    }

    fn id(&self) -> StoreResult<RecordId> {
        self.record_id(ID_FIELD)
    }

    fn record_id(&self, field: &str) -> StoreResult<RecordId> {
        let raw = self.text(field)?;
        RecordId::parse(&raw).map_err(|e| self.corrupt(format!("field '{field}': {e}")))
    }

    fn text(&self, field: &str) -> StoreResult<String> {
        match self.document.get(field) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(self.corrupt(format!("field '{field}' is not text: {other}"))),
            None => Err(self.corrupt(format!("missing field '{field}'"))),
        }
    }

    fn number(&self, field: &str) -> StoreResult<f64> {
        self.document
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.corrupt(format!("field '{field}' is not a number")))
    }

    fn count(&self, field: &str) -> StoreResult<u32> {
        self.document
            .get(field)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.corrupt(format!("field '{field}' is not a non-negative integer")))
    }
}

fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
