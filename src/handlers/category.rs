use super::{FormPairs, SharedState, form_input, parse_id};
use crate::catalog::DeleteOutcome;
use crate::error::{AppError, AppResult};
use crate::model::{CATEGORY_LIST_PATH, Category, Product, ProductSummary};
use crate::state::AppState;
use crate::validation::{CategoryInput, FieldError, FormSchema};
use crate::views;
use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct ListPage {
    title: &'static str,
    categories: Vec<Category>,
}

#[derive(Serialize)]
struct DetailPage {
    title: String,
    category: Category,
    products: Vec<ProductSummary>,
}

#[derive(Serialize)]
struct FormPage<'a> {
    title: &'static str,
    category: Option<&'a CategoryInput>,
    errors: &'a [FieldError],
}

#[derive(Serialize)]
struct DeletePage {
    title: &'static str,
    category: Category,
    products: Vec<Product>,
}

const CREATE_TITLE: &str = "Create Category";
const UPDATE_TITLE: &str = "Update Category";

fn render_form(
    state: &AppState,
    title: &'static str,
    input: Option<&CategoryInput>,
    errors: &[FieldError],
) -> AppResult<Html<String>> {
    let page = FormPage {
        title,
        category: input,
        errors,
    };
    Ok(state.views().render(views::CATEGORY_FORM, &page)?)
}

fn render_delete(
    state: &AppState,
    category: Category,
    products: Vec<Product>,
) -> AppResult<Html<String>> {
    let page = DeletePage {
        title: "Delete Category",
        category,
        products,
    };
    Ok(state.views().render(views::CATEGORY_DELETE, &page)?)
}

/// `GET /store/categories`
pub async fn list(State(state): SharedState) -> AppResult<Html<String>> {
    let categories = state.catalog().category_list().await?;
    let page = ListPage {
        title: "Category List",
        categories,
    };
    Ok(state.views().render(views::CATEGORY_LIST, &page)?)
}

/// `GET /store/category/{id}`
pub async fn detail(State(state): SharedState, Path(id): Path<String>) -> AppResult<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Category"))?;
    let detail = state
        .catalog()
        .category_detail(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    let page = DetailPage {
        title: format!("Category: {}", detail.category.name),
        category: detail.category,
        products: detail.products,
    };
    Ok(state.views().render(views::CATEGORY_DETAIL, &page)?)
}

/// `GET /store/category/create`
pub async fn create_form(State(state): SharedState) -> AppResult<Html<String>> {
    render_form(&state, CREATE_TITLE, None, &[])
}

/// `POST /store/category/create`
pub async fn create(State(state): SharedState, Form(pairs): FormPairs) -> AppResult<Response> {
    let validated = CategoryInput::from_form(&form_input(pairs));
    match validated.into_fields() {
        Ok(fields) => {
            let category = state.catalog().create_category(fields).await?;
            Ok(Redirect::to(&category.url()).into_response())
        }
        Err(rejected) => {
            let page = render_form(&state, CREATE_TITLE, Some(&rejected.input), &rejected.errors)?;
            Ok(page.into_response())
        }
    }
}

/// `GET /store/category/{id}/update`
pub async fn update_form(State(state): SharedState, Path(id): Path<String>) -> AppResult<Html<String>> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Category"))?;
    let category = state
        .catalog()
        .find_category(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    let input = CategoryInput::from_category(&category);
    render_form(&state, UPDATE_TITLE, Some(&input), &[])
}

/// `POST /store/category/{id}/update`
///
/// The record is addressed by the path id; ids in the body are ignored.
pub async fn update(
    State(state): SharedState,
    Path(id): Path<String>,
    Form(pairs): FormPairs,
) -> AppResult<Response> {
    let id = parse_id(&id).ok_or(AppError::NotFound("Category"))?;
    let validated = CategoryInput::from_form(&form_input(pairs));
    match validated.into_fields() {
        Ok(fields) => {
            let category = state
                .catalog()
                .replace_category(id, fields)
                .await?
                .ok_or(AppError::NotFound("Category"))?;
            Ok(Redirect::to(&category.url()).into_response())
        }
        Err(rejected) => {
            let page = render_form(&state, UPDATE_TITLE, Some(&rejected.input), &rejected.errors)?;
            Ok(page.into_response())
        }
    }
}

/// `GET /store/category/{id}/delete`
pub async fn delete_form(State(state): SharedState, Path(id): Path<String>) -> AppResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(CATEGORY_LIST_PATH).into_response());
    };
    match state.catalog().category_delete_context(id).await? {
        Some(context) => {
            Ok(render_delete(&state, context.category, context.products)?.into_response())
        }
        None => Ok(Redirect::to(CATEGORY_LIST_PATH).into_response()),
    }
}

/// `POST /store/category/{id}/delete`
pub async fn delete(State(state): SharedState, Path(id): Path<String>) -> AppResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(CATEGORY_LIST_PATH).into_response());
    };
    match state.catalog().delete_category_if_unused(id).await? {
        DeleteOutcome::Deleted | DeleteOutcome::Missing => {
            Ok(Redirect::to(CATEGORY_LIST_PATH).into_response())
        }
        DeleteOutcome::Blocked(context) => {
            debug!(category_id = %id, "re-rendering blocked delete");
            Ok(render_delete(&state, context.category, context.products)?.into_response())
        }
    }
}
