//! Rule sets for the category and product forms.

use super::rules::{FieldRules, Rule};
use super::sanitize::normalize_array;
use super::{FieldError, FormInput, FormSchema, Validated};
use crate::model::{
    CATEGORY_DESCRIPTION_MAX, CATEGORY_IMAGE_MAX, CATEGORY_NAME_MAX, Category, CategoryFields,
    PRODUCT_DESCRIPTION_MAX, PRODUCT_NAME_MAX, Product, ProductFields, RecordId,
};
use serde::Serialize;

/// Cleaned category form values, escaped and ready to redisplay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl CategoryInput {
    /// Form values for editing an existing category.
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
        }
    }
}

fn category_rules() -> [FieldRules; 3] {
    [
        FieldRules::new("name")
            .rule(Rule::Required, "Category name must be specified.")
            .rule(
                Rule::MaxLength(CATEGORY_NAME_MAX),
                "Category name must be at most 25 characters.",
            ),
        FieldRules::new("description")
            .rule(Rule::Required, "Category description must be specified.")
            .rule(
                Rule::MaxLength(CATEGORY_DESCRIPTION_MAX),
                "Category description must be at most 200 characters.",
            ),
        FieldRules::new("image")
            .rule(Rule::Required, "Category image must be specified.")
            .rule(
                Rule::MaxLength(CATEGORY_IMAGE_MAX),
                "Category image must be at most 200 characters.",
            ),
    ]
}

impl FormSchema for CategoryInput {
    const NAME: &'static str = "category";

    type Fields = CategoryFields;

    fn from_form(form: &FormInput) -> Validated<Self> {
        let mut errors = Vec::new();
        let [name, description, image] =
            category_rules().map(|rules| rules.apply(form.text(rules.field()), &mut errors));
        Validated {
            input: Self {
                name,
                description,
                image,
            },
            errors,
        }
    }

    fn to_fields(&self) -> Result<CategoryFields, FieldError> {
        Ok(CategoryFields {
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
        })
    }
}

/// Cleaned product form values.
///
/// Price and stock stay textual so a rejected submission redisplays exactly
/// what was typed. `category` is the normalized array field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub stock: String,
    pub category: Vec<String>,
}

impl ProductInput {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: format!("{:.2}", product.price),
            description: product.description.clone(),
            image: product.image.clone(),
            stock: product.stock.to_string(),
            category: vec![product.category.to_string()],
        }
    }

    /// The category id when exactly one parseable id was submitted.
    pub fn selected_category(&self) -> Option<RecordId> {
        match self.category.as_slice() {
            [single] => RecordId::parse(single).ok(),
            _ => None,
        }
    }
}

fn product_rules() -> [FieldRules; 5] {
    [
        FieldRules::new("name")
            .rule(Rule::Required, "Product name must be specified.")
            .rule(
                Rule::MaxLength(PRODUCT_NAME_MAX),
                "Product name must be at most 25 characters.",
            ),
        FieldRules::new("price")
            .rule(Rule::Required, "Price must be specified.")
            .rule(Rule::Numeric, "Price must be a number."),
        FieldRules::new("description")
            .rule(Rule::Required, "Product description must be specified.")
            .rule(
                Rule::MaxLength(PRODUCT_DESCRIPTION_MAX),
                "Product description must be at most 200 characters.",
            ),
        FieldRules::new("image").rule(Rule::Required, "Product image must be specified."),
        FieldRules::new("stock")
            .rule(Rule::Required, "Stock must be specified.")
            .rule(Rule::Integer, "Stock must be a whole number."),
    ]
}

impl FormSchema for ProductInput {
    const NAME: &'static str = "product";

    type Fields = ProductFields;

    fn from_form(form: &FormInput) -> Validated<Self> {
        let mut errors = Vec::new();
        let [name, price, description, image, stock] =
            product_rules().map(|rules| rules.apply(form.text(rules.field()), &mut errors));

        let raw_categories = normalize_array(form.get("category"));
        let category = FieldRules::new("category")
            .rule(Rule::RecordId, "Category is not a valid selection.")
            .apply_each(&raw_categories, &mut errors);
        match category.len() {
            0 => errors.push(FieldError::new("category", "Category must be selected.")),
            1 => {}
            _ => errors.push(FieldError::new("category", "Select a single category.")),
        }

        Validated {
            input: Self {
                name,
                price,
                description,
                image,
                stock,
                category,
            },
            errors,
        }
    }

    fn to_fields(&self) -> Result<ProductFields, FieldError> {
        let price = self
            .price
            .parse::<f64>()
            .map_err(|_| FieldError::new("price", "Price must be a number."))?;
        if !price.is_finite() {
            return Err(FieldError::new("price", "Price is out of range."));
        }
        let stock = self
            .stock
            .parse::<u32>()
            .map_err(|_| FieldError::new("stock", "Stock is out of range."))?;
        let category = self
            .selected_category()
            .ok_or_else(|| FieldError::new("category", "Category must be selected."))?;
        Ok(ProductFields {
            name: self.name.clone(),
            price,
            description: self.description.clone(),
            image: self.image.clone(),
            stock,
            category,
        })
    }
}
