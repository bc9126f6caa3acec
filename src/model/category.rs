use super::{RecordId, STORE_PREFIX};
use serde::ser::{Serialize, SerializeStruct, Serializer};

pub const CATEGORY_NAME_MAX: usize = 25;
pub const CATEGORY_DESCRIPTION_MAX: usize = 200;
pub const CATEGORY_IMAGE_MAX: usize = 200;

/// Validated category attributes, without identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// A stored category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub image: String,
}

impl Category {
    pub fn from_fields(id: RecordId, fields: CategoryFields) -> Self {
        let CategoryFields {
            name,
            description,
            image,
        } = fields;
        Self {
            id,
            name,
            description,
            image,
        }
    }

    /// Canonical path, used as the redirect target after writes.
    pub fn url(&self) -> String {
        category_url(self.id)
    }
}

pub(crate) fn category_url(id: RecordId) -> String {
    format!("{STORE_PREFIX}/category/{id}")
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Category", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("image", &self.image)?;
        state.serialize_field("url", &self.url())?;
        state.end()
    }
}
