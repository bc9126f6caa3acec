//! Catalog entities.
//!
//! Entities are plain immutable records. Persistence lives in
//! [`crate::repository`]; these types only describe shape, bounds and the
//! canonical path derived from an identifier.

mod category;
mod product;

pub use category::{
    CATEGORY_DESCRIPTION_MAX, CATEGORY_IMAGE_MAX, CATEGORY_NAME_MAX, Category, CategoryFields,
};
pub use product::{
    PRODUCT_DESCRIPTION_MAX, PRODUCT_NAME_MAX, Product, ProductDetail, ProductFields,
    ProductListing, ProductSummary,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Mount point of the catalog routes; canonical paths start here.
pub const STORE_PREFIX: &str = "/store";

/// Path of the category listing page.
pub const CATEGORY_LIST_PATH: &str = "/store/categories";

/// Path of the product listing page.
pub const PRODUCT_LIST_PATH: &str = "/store/products";

/// Opaque record identifier assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(Uuid);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a valid record id")]
pub struct InvalidRecordId {
    pub input: String,
}

impl RecordId {
    /// Allocates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Result<Self, InvalidRecordId> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| InvalidRecordId {
                input: input.to_string(),
            })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = InvalidRecordId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_displays_as_simple_hex() {
        let id = RecordId::generate();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 32);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(RecordId::parse(&rendered), Ok(id));
    }

    #[test]
    fn record_id_accepts_hyphenated_form() {
        let parsed = RecordId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(parsed.to_string(), "67e5504410b1426f9247bb680e5fe0c8");
    }

    #[test]
    fn record_id_rejects_garbage() {
        assert!(RecordId::parse("not-an-id").is_err());
        assert!(RecordId::parse("").is_err());
    }
}
