//! Page-level read compositions and writes over the repositories.
//!
//! Independent reads for one page run concurrently and are joined before the
//! page proceeds. Reference resolution ("populate") is an explicit second
//! read keyed by the ids gathered from the first.

use crate::model::{
    Category, CategoryFields, Product, ProductDetail, ProductFields, ProductListing,
    ProductSummary, RecordId,
};
use crate::repository::{CategoryRepository, ProductRepository};
use crate::store::{DocumentStore, StoreResult};
use futures::{join, try_join};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Record counts for the home page.
///
/// A failed count does not fail the page: the error text is kept for display
/// and the counts that did succeed are still reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeSummary {
    pub category_count: Option<u64>,
    pub product_count: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub products: Vec<ProductSummary>,
}

/// A category together with every product that references it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDeleteContext {
    pub category: Category,
    pub products: Vec<Product>,
}

impl CategoryDeleteContext {
    pub fn is_blocked(&self) -> bool {
        !self.products.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    /// Products still reference the category; nothing was removed.
    Blocked(CategoryDeleteContext),
    Missing,
}

/// What the product edit form needs: the product and the category choices.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFormContext {
    pub product: ProductDetail,
    pub categories: Vec<Category>,
}

#[derive(Clone)]
pub struct CatalogService {
    categories: CategoryRepository,
    products: ProductRepository,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            categories: CategoryRepository::new(store.clone()),
            products: ProductRepository::new(store),
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn home(&self) -> HomeSummary {
        let (categories, products) = join!(self.categories.count(), self.products.count());
        let mut summary = HomeSummary::default();
        let mut errors = Vec::new();
        match categories {
            Ok(count) => summary.category_count = Some(count),
            Err(error) => errors.push(error.to_string()),
        }
        match products {
            Ok(count) => summary.product_count = Some(count),
            Err(error) => errors.push(error.to_string()),
        }
        if !errors.is_empty() {
            warn!(errors = ?errors, "home page counts failed");
            summary.error = Some(errors.join("; "));
        }
        summary
    }

    /// Every category, ascending by name.
    pub async fn category_list(&self) -> StoreResult<Vec<Category>> {
        self.categories.list_by_name().await
    }

    /// Options for the product form's category control.
    pub async fn category_choices(&self) -> StoreResult<Vec<Category>> {
        self.category_list().await
    }

    pub async fn find_category(&self, id: RecordId) -> StoreResult<Option<Category>> {
        self.categories.find_by_id(id).await
    }

    /// The category and the name and price of each of its products.
    #[instrument(level = "debug", skip(self))]
    pub async fn category_detail(&self, id: RecordId) -> StoreResult<Option<CategoryDetail>> {
        let (category, products) = try_join!(
            self.categories.find_by_id(id),
            self.products.summaries_in_category(id)
        )?;
        Ok(category.map(|category| CategoryDetail { category, products }))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn category_delete_context(
        &self,
        id: RecordId,
    ) -> StoreResult<Option<CategoryDeleteContext>> {
        let (category, products) = try_join!(
            self.categories.find_by_id(id),
            self.products.in_category(id)
        )?;
        Ok(category.map(|category| CategoryDeleteContext { category, products }))
    }

    pub async fn create_category(&self, fields: CategoryFields) -> StoreResult<Category> {
        let category = self.categories.create(fields).await?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn replace_category(
        &self,
        id: RecordId,
        fields: CategoryFields,
    ) -> StoreResult<Option<Category>> {
        let replaced = self.categories.replace(id, fields).await?;
        if replaced.is_some() {
            info!(category_id = %id, "category updated");
        }
        Ok(replaced)
    }

    /// Deletes the category only when no product references it.
    ///
    /// Dependents are re-read at submission time rather than trusted from
    /// the confirmation page.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_category_if_unused(&self, id: RecordId) -> StoreResult<DeleteOutcome> {
        let Some(context) = self.category_delete_context(id).await? else {
            return Ok(DeleteOutcome::Missing);
        };
        if context.is_blocked() {
            info!(
                category_id = %id,
                dependents = context.products.len(),
                "category delete blocked by products"
            );
            return Ok(DeleteOutcome::Blocked(context));
        }
        if self.categories.delete(id).await? {
            info!(category_id = %id, "category deleted");
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Missing)
        }
    }

    /// Name, price and resolved category of every product, ascending by name.
    #[instrument(level = "debug", skip_all)]
    pub async fn product_list(&self) -> StoreResult<Vec<ProductListing>> {
        let rows = self.products.list_rows().await?;
        let ids: Vec<RecordId> = rows
            .iter()
            .map(|row| row.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let categories = self.resolve_categories(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| ProductListing {
                id: row.id,
                name: row.name,
                price: row.price,
                category: categories.get(&row.category).cloned(),
            })
            .collect())
    }

    /// The full product with its category resolved.
    pub async fn product_detail(&self, id: RecordId) -> StoreResult<Option<ProductDetail>> {
        let Some(product) = self.products.find_by_id(id).await? else {
            return Ok(None);
        };
        let category = self.categories.find_by_id(product.category).await?;
        if category.is_none() {
            debug!(product_id = %id, category_id = %product.category, "dangling category reference");
        }
        Ok(Some(ProductDetail { product, category }))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn product_form_context(
        &self,
        id: RecordId,
    ) -> StoreResult<Option<ProductFormContext>> {
        let (product, categories) = try_join!(self.product_detail(id), self.category_choices())?;
        Ok(product.map(|product| ProductFormContext {
            product,
            categories,
        }))
    }

    pub async fn create_product(&self, fields: ProductFields) -> StoreResult<Product> {
        let product = self.products.create(fields).await?;
        info!(product_id = %product.id, category_id = %product.category, "product created");
        Ok(product)
    }

    pub async fn replace_product(
        &self,
        id: RecordId,
        fields: ProductFields,
    ) -> StoreResult<Option<Product>> {
        let replaced = self.products.replace(id, fields).await?;
        if replaced.is_some() {
            info!(product_id = %id, "product updated");
        }
        Ok(replaced)
    }

    /// Unconditional; nothing references a product.
    pub async fn delete_product(&self, id: RecordId) -> StoreResult<bool> {
        let deleted = self.products.delete(id).await?;
        if deleted {
            info!(product_id = %id, "product deleted");
        }
        Ok(deleted)
    }

    async fn resolve_categories(
        &self,
        ids: &[RecordId],
    ) -> StoreResult<HashMap<RecordId, Category>> {
        let found = self.categories.find_many(ids).await?;
        Ok(found.into_iter().map(|c| (c.id, c)).collect())
    }
}
