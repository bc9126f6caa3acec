//! Fixture catalog for `populatedb`.
//!
//! Fixtures go through the same form validation as the web pages so stored
//! text is trimmed and escaped identically.

use crate::catalog::CatalogService;
use crate::model::{Category, PRODUCT_DESCRIPTION_MAX, Product};
use crate::store::{DocumentStore, StoreError};
use crate::validation::{CategoryInput, FieldError, FormInput, FormSchema, ProductInput};
use futures::future::try_join_all;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub const USAGE: &str = "This utility populates some test products and categories into the store. \
Pass the store target as the only argument, e.g.: populatedb file:///var/lib/corner-store/catalog.json";

pub struct CategoryFixture {
    pub name: &'static str,
    pub description: &'static str,
    pub image: &'static str,
}

pub struct ProductFixture {
    pub name: &'static str,
    pub price: f64,
    pub description: &'static str,
    pub image: &'static str,
    pub stock: u32,
    /// Position in [`CATEGORIES`].
    pub category: usize,
}

pub const CATEGORIES: [CategoryFixture; 6] = [
    CategoryFixture {
        name: "Fruit",
        description: "We get all of our fruit from PepperRidge Farms.",
        image: "image1",
    },
    CategoryFixture {
        name: "Baked Goods",
        description: "Freshly baked every day, please order ahead to guarantee a specific item. Everything is 50% off after 4pm.",
        image: "image2",
    },
    CategoryFixture {
        name: "Vegetables",
        description: "this is the default description for Vegetables.",
        image: "image3",
    },
    CategoryFixture {
        name: "Coffee",
        description: "We have the best coffee in town!",
        image: "image4",
    },
    CategoryFixture {
        name: "Dairy",
        description: "Our dairy products are all locally sourced.",
        image: "image5",
    },
    CategoryFixture {
        name: "Junk",
        description: "Who doesn't like to pig out from time to time?",
        image: "image6",
    },
];

pub const PRODUCTS: [ProductFixture; 16] = [
    ProductFixture {
        name: "Eggs (1 dozen)",
        price: 4.11,
        description: "Eggs have a hard shell of calcium carbonate enclosing a liquid white, a single yolk (or an occasional double yolk)and an air cell.",
        image: "eggs.png",
        stock: 15,
        category: 4,
    },
    ProductFixture {
        name: "Gala Apples",
        price: 0.99,
        description: "Super juicy and delicious.",
        image: "apples.png",
        stock: 122,
        category: 0,
    },
    ProductFixture {
        name: "Bananas",
        price: 1.79,
        description: "The banana is a lengthy yellow fruit, found in the market in groups of three to twenty fruits, similar to a triangular cucumber, oblong and normally yellow.",
        image: "bananas.png",
        stock: 87,
        category: 0,
    },
    ProductFixture {
        name: "Apple Fritter",
        price: 0.89,
        description: "Made with Gala Apples",
        image: "fritter.png",
        stock: 12,
        category: 1,
    },
    ProductFixture {
        name: "Mango",
        price: 14.99,
        description: "Pricey but totally worth it!",
        image: "mango.png",
        stock: 6,
        category: 0,
    },
    ProductFixture {
        name: "Latte",
        price: 8.11,
        description: "A latte or caffè latte is a milk coffee that boasts a silky layer of foam as a real highlight to the drink.",
        image: "eggs.png",
        stock: 15,
        category: 3,
    },
    ProductFixture {
        name: "Kale",
        price: 9.69,
        description: "Perfect for salads and smoothies.",
        image: "kale02.png",
        stock: 22,
        category: 2,
    },
    ProductFixture {
        name: "Bok Choy",
        price: 7.52,
        description: "Bok Choy, also called white Chinese cabbage, belongs to the leafy vegetable pak choi family of Chinese brassicas. Bok Choy has white or green, thick, crunchy stems with light to dark green wide leaves.",
        image: "bokchoy.png",
        stock: 7,
        category: 2,
    },
    ProductFixture {
        name: "Butter",
        price: 7.89,
        description: "Butter is a dairy product made from the fat and protein components of churned cream. It is a semi-solid emulsion at room temperature, consisting of approximately 80% butterfat.",
        image: "butter14.jpg",
        stock: 5,
        category: 4,
    },
    ProductFixture {
        name: "Cheese",
        price: 100.99,
        description: "Cheese is valued for its portability, long shelf life, and high content of fat, protein, calcium, and phosphorus.",
        image: "cheesy.png",
        stock: 14,
        category: 4,
    },
    ProductFixture {
        name: "Ice Creame",
        price: 15.99,
        description: "Ice cream is a sweetened frozen food typically eaten as a snack or dessert.",
        image: "icecreame.png",
        stock: 7,
        category: 4,
    },
    ProductFixture {
        name: "Cappuccino",
        price: 7.89,
        description: "The name comes from the Capuchin friars, referring to the colour of their habits.",
        image: "cappa.png",
        stock: 128,
        category: 3,
    },
    ProductFixture {
        name: "Cold Brew Coffee",
        price: 6.99,
        description: "Cold brewing, also called cold water extraction or cold pressing, is the process of steeping coffee grounds in water at cool temperatures for an extended period.",
        image: "coldcoffee.png",
        stock: 16,
        category: 3,
    },
    ProductFixture {
        name: "Espresso",
        price: 4.11,
        description: "Espresso is generally thicker than coffee brewed by other methods, with a viscosity of warm honey.",
        image: "espresso.png",
        stock: 85,
        category: 3,
    },
    ProductFixture {
        name: "Artichoke",
        price: 19.69,
        description: "The edible portion of the plant consists of the flower buds before the flowers come into bloom.",
        image: "artichoke99.png",
        stock: 35,
        category: 2,
    },
    ProductFixture {
        name: "Broccoli",
        price: 4.53,
        description: "It is eaten either raw or cooked. Broccoli is a particularly rich source of vitamin C and vitamin K.",
        image: "brocco.png",
        stock: 17,
        category: 2,
    },
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{form} fixture '{name}' rejected: {}", join_messages(.errors))]
    Rejected {
        form: &'static str,
        name: &'static str,
        errors: Vec<FieldError>,
    },
    #[error("product fixture '{name}' references missing category #{index}")]
    UnknownCategory { name: &'static str, index: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything `populate` created, in fixture order.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

/// Cuts `text` at a word boundary so it holds at most `max` characters,
/// ending with an ellipsis.
pub fn abridge(text: &str, max: usize) -> Cow<'_, str> {
    if text.chars().count() <= max {
        return Cow::Borrowed(text);
    }
    let budget = max.saturating_sub(3);
    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = head
        .rfind(char::is_whitespace)
        .map(|idx| &head[..idx])
        .unwrap_or(head)
        .trim_end_matches(|c: char| c.is_whitespace() || c == ',');
    Cow::Owned(format!("{head}..."))
}

/// Creates the fixture categories one after another, then every fixture
/// product concurrently.
pub async fn populate(store: Arc<dyn DocumentStore>) -> Result<SeedReport, SeedError> {
    let catalog = CatalogService::new(store);

    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for fixture in &CATEGORIES {
        let category = create_category(&catalog, fixture).await?;
        info!(id = %category.id, name = %category.name, "new category");
        categories.push(category);
    }

    let products = try_join_all(
        PRODUCTS
            .iter()
            .map(|fixture| create_product(&catalog, &categories, fixture)),
    )
    .await?;

    Ok(SeedReport {
        categories,
        products,
    })
}

async fn create_category(
    catalog: &CatalogService,
    fixture: &CategoryFixture,
) -> Result<Category, SeedError> {
    let form = FormInput::from_pairs([
        ("name", fixture.name),
        ("description", fixture.description),
        ("image", fixture.image),
    ]);
    let fields = CategoryInput::from_form(&form)
        .into_fields()
        .map_err(|rejected| SeedError::Rejected {
            form: CategoryInput::NAME,
            name: fixture.name,
            errors: rejected.errors,
        })?;
    Ok(catalog.create_category(fields).await?)
}

async fn create_product(
    catalog: &CatalogService,
    categories: &[Category],
    fixture: &ProductFixture,
) -> Result<Product, SeedError> {
    let category = categories
        .get(fixture.category)
        .ok_or(SeedError::UnknownCategory {
            name: fixture.name,
            index: fixture.category,
        })?;

    let price = fixture.price.to_string();
    let stock = fixture.stock.to_string();
    let category_id = category.id.to_string();
    let description = abridge(fixture.description, PRODUCT_DESCRIPTION_MAX);
    let form = FormInput::from_pairs([
        ("name", fixture.name),
        ("price", price.as_str()),
        ("description", description.as_ref()),
        ("image", fixture.image),
        ("stock", stock.as_str()),
        ("category", category_id.as_str()),
    ]);
    let fields = ProductInput::from_form(&form)
        .into_fields()
        .map_err(|rejected| SeedError::Rejected {
            form: ProductInput::NAME,
            name: fixture.name,
            errors: rejected.errors,
        })?;

    let product = catalog.create_product(fields).await?;
    info!(id = %product.id, name = %product.name, category = %category.name, "new product");
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abridge_keeps_short_text() {
        assert_eq!(abridge("Made with Gala Apples", 200), "Made with Gala Apples");
    }

    #[test]
    fn abridge_cuts_on_a_word_boundary() {
        let abridged = abridge("one two three four", 12);
        assert_eq!(abridged, "one two...");
        assert!(abridged.chars().count() <= 12);
    }

    #[test]
    fn every_fixture_fits_after_abridging() {
        for fixture in &PRODUCTS {
            assert!(abridge(fixture.description, PRODUCT_DESCRIPTION_MAX).chars().count() <= 200);
            assert!(fixture.category < CATEGORIES.len(), "{}", fixture.name);
        }
    }
}
