//! One axum handler per catalog route.
//!
//! Write handlers follow the same pipeline: decode the form, validate,
//! re-render the form on errors, otherwise persist and redirect (303) to the
//! record's canonical path.

pub mod category;
pub mod product;

use crate::error::AppResult;
use crate::model::{Category, RecordId, STORE_PREFIX};
use crate::state::AppState;
use crate::validation::FormInput;
use crate::views;
use axum::extract::State;
use axum::response::{Html, Redirect};
use serde::Serialize;
use std::sync::Arc;

pub type SharedState = State<Arc<AppState>>;

/// Url-encoded body with repeated keys kept.
pub type FormPairs = axum::Form<Vec<(String, String)>>;

pub(crate) fn form_input(pairs: Vec<(String, String)>) -> FormInput {
    FormInput::from_pairs(pairs)
}

/// A path id that does not parse names no record.
pub(crate) fn parse_id(raw: &str) -> Option<RecordId> {
    RecordId::parse(raw).ok()
}

#[derive(Serialize)]
struct HomePage {
    title: &'static str,
    category_count: Option<u64>,
    product_count: Option<u64>,
    error: Option<&'static str>,
}

const COUNTS_UNAVAILABLE: &str = "Counts are unavailable right now.";

/// `GET /store`
pub async fn home(State(state): SharedState) -> AppResult<Html<String>> {
    let summary = state.catalog().home().await;
    let page = HomePage {
        title: "Corner Store Home",
        category_count: summary.category_count,
        product_count: summary.product_count,
        error: summary.error.map(|_| COUNTS_UNAVAILABLE),
    };
    Ok(state.views().render(views::INDEX, &page)?)
}

/// `GET /`
pub async fn root() -> Redirect {
    Redirect::to(STORE_PREFIX)
}

/// One option of the product form's category control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChoice {
    pub id: RecordId,
    pub name: String,
    pub selected: bool,
}

impl CategoryChoice {
    pub fn list(categories: Vec<Category>, selected: &[RecordId]) -> Vec<Self> {
        categories
            .into_iter()
            .map(|category| Self {
                selected: selected.contains(&category.id),
                id: category.id,
                name: category.name,
            })
            .collect()
    }
}
