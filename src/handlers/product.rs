use super::{CategoryChoice, FormPairs, SharedState, form_input, parse_id};
use crate::error::{AppError, AppResult};
use crate::model::{Category, PRODUCT_LIST_PATH, ProductDetail, ProductListing, RecordId};
use crate::state::AppState;
use crate::validation::{FieldError, FormSchema, ProductInput, Validated};
use crate::views;
use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;

#[derive(Serialize)]
struct ListPage {
    title: &'static str,
    products: Vec<ProductListing>,
}

#[derive(Serialize)]
struct ProductPage {
    title: String,
    product: ProductDetail,
}

#[derive(Serialize)]
struct FormPage<'a> {
    title: &'static str,
    product: Option<&'a ProductInput>,
    categories: Vec<CategoryChoice>,
    errors: &'a [FieldError],
}

const CREATE_TITLE: &str = "Create Product";
const UPDATE_TITLE: &str = "Update Product";

fn selected_ids(input: Option<&ProductInput>) -> Vec<RecordId> {
    input
        .map(|input| {
            input
                .category
                .iter()
                .filter_map(|raw| parse_id(raw))
                .collect()
        })
        .unwrap_or_default()
}

fn render_form(
    state: &AppState,
    title: &'static str,
    input: Option<&ProductInput>,
    categories: Vec<Category>,
    errors: &[FieldError],
) -> AppResult<Html<String>> {
    let page = FormPage {
        title,
        product: input,
        categories: CategoryChoice::list(categories, &selected_ids(input)),
        errors,
    };
    Ok(state.views().render(views::PRODUCT_FORM, &page)?)
}

/// Flags a selected category that does not exist.
///
/// Only checked once every other rule passed, so a rejected form costs no
/// extra read.
async fn check_category(state: &AppState, validated: &mut Validated<ProductInput>) -> AppResult<()> {
    if !validated.is_valid() {
        return Ok(());
    }
    if let Some(category) = validated.input.selected_category() {
        if state.catalog().find_category(category).await?.is_none() {
            validated
                .errors
                .push(FieldError::new("category", "Selected category does not exist."));
        }
    }
    Ok(())
}

/// `GET /store/products`
pub async fn list(State(state): SharedState) -> AppResult<Html<String>> {
    let products = state.catalog().product_list().await?;
    let page = ListPage {
        title: "Product List",
        products,
    };
    Ok(state.views().render(views::PRODUCT_LIST, &page)?)
}

/// `GET /store/product/{id}`
pub async fn detail(State(state): SharedState, Path(id): Path<String>) -> AppResult<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Product"))?;
    let product = state
        .catalog()
        .product_detail(id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    let page = ProductPage {
        title: format!("Product: {}", product.product.name),
        product,
    };
    Ok(state.views().render(views::PRODUCT_DETAIL, &page)?)
}

/// `GET /store/product/create`
pub async fn create_form(State(state): SharedState) -> AppResult<Html<String>> {
    let categories = state.catalog().category_choices().await?;
    render_form(&state, CREATE_TITLE, None, categories, &[])
}

/// `POST /store/product/create`
pub async fn create(State(state): SharedState, Form(pairs): FormPairs) -> AppResult<Response> {
    let mut validated = ProductInput::from_form(&form_input(pairs));
    check_category(&state, &mut validated).await?;
    match validated.into_fields() {
        Ok(fields) => {
            let product = state.catalog().create_product(fields).await?;
            Ok(Redirect::to(&product.url()).into_response())
        }
        Err(rejected) => {
            let categories = state.catalog().category_choices().await?;
            let page = render_form(
                &state,
                CREATE_TITLE,
                Some(&rejected.input),
                categories,
                &rejected.errors,
            )?;
            Ok(page.into_response())
        }
    }
}

/// `GET /store/product/{id}/update`
pub async fn update_form(State(state): SharedState, Path(id): Path<String>) -> AppResult<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Product"))?;
    let context = state
        .catalog()
        .product_form_context(id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    let input = ProductInput::from_product(&context.product.product);
    render_form(&state, UPDATE_TITLE, Some(&input), context.categories, &[])
}

/// `POST /store/product/{id}/update`
///
/// The record is addressed by the path id; ids in the body are ignored.
pub async fn update(
    State(state): SharedState,
    Path(id): Path<String>,
    Form(pairs): FormPairs,
) -> AppResult<Response> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Product"))?;
    let mut validated = ProductInput::from_form(&form_input(pairs));
    check_category(&state, &mut validated).await?;
    match validated.into_fields() {
        Ok(fields) => {
            let product = state
                .catalog()
                .replace_product(id, fields)
                .await?
                .ok_or(AppError::NotFound("Product"))?;
            Ok(Redirect::to(&product.url()).into_response())
        }
        Err(rejected) => {
            let context = state
                .catalog()
                .product_form_context(id)
                .await?
                .ok_or(AppError::NotFound("Product"))?;
            let page = render_form(
                &state,
                UPDATE_TITLE,
                Some(&rejected.input),
                context.categories,
                &rejected.errors,
            )?;
            Ok(page.into_response())
        }
    }
}

/// `GET /store/product/{id}/delete`
pub async fn delete_form(State(state): SharedState, Path(id): Path<String>) -> AppResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(PRODUCT_LIST_PATH).into_response());
    };
    match state.catalog().product_detail(id).await? {
        Some(product) => {
            let page = ProductPage {
                title: "Delete Product".to_string(),
                product,
            };
            Ok(state
                .views()
                .render(views::PRODUCT_DELETE, &page)?
                .into_response())
        }
        None => Ok(Redirect::to(PRODUCT_LIST_PATH).into_response()),
    }
}

/// `POST /store/product/{id}/delete`
pub async fn delete(State(state): SharedState, Path(id): Path<String>) -> AppResult<Redirect> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Product"))?;
    state.catalog().delete_product(id).await?;
    Ok(Redirect::to(PRODUCT_LIST_PATH))
}
