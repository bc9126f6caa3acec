use super::{Category, RecordId, STORE_PREFIX};
use serde::ser::{Serialize, SerializeStruct, Serializer};

pub const PRODUCT_NAME_MAX: usize = 25;
pub const PRODUCT_DESCRIPTION_MAX: usize = 200;

/// Validated product attributes, without identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub stock: u32,
    pub category: RecordId,
}

/// A stored product. The category is a weak reference by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub stock: u32,
    pub category: RecordId,
}

impl Product {
    pub fn from_fields(id: RecordId, fields: ProductFields) -> Self {
        let ProductFields {
            name,
            price,
            description,
            image,
            stock,
            category,
        } = fields;
        Self {
            id,
            name,
            price,
            description,
            image,
            stock,
            category,
        }
    }

    pub fn url(&self) -> String {
        product_url(self.id)
    }
}

pub(crate) fn product_url(id: RecordId) -> String {
    format!("{STORE_PREFIX}/product/{id}")
}

/// Name and price only; what the category detail page lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: RecordId,
    pub name: String,
    pub price: f64,
}

impl ProductSummary {
    pub fn url(&self) -> String {
        product_url(self.id)
    }
}

/// Row of the product list: name, price and the resolved category.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductListing {
    pub id: RecordId,
    pub name: String,
    pub price: f64,
    /// `None` when the referenced category no longer exists.
    pub category: Option<Category>,
}

impl ProductListing {
    pub fn url(&self) -> String {
        product_url(self.id)
    }
}

/// A full product with its category resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<Category>,
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Product", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("image", &self.image)?;
        state.serialize_field("stock", &self.stock)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("url", &self.url())?;
        state.end()
    }
}

impl Serialize for ProductSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProductSummary", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("url", &self.url())?;
        state.end()
    }
}

impl Serialize for ProductListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProductListing", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("url", &self.url())?;
        state.end()
    }
}

impl Serialize for ProductDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let product = &self.product;
        let mut state = serializer.serialize_struct("ProductDetail", 8)?;
        state.serialize_field("id", &product.id)?;
        state.serialize_field("name", &product.name)?;
        state.serialize_field("price", &product.price)?;
        state.serialize_field("description", &product.description)?;
        state.serialize_field("image", &product.image)?;
        state.serialize_field("stock", &product.stock)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("url", &product.url())?;
        state.end()
    }
}
