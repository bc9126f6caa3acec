//! Tera-backed view renderer.
//!
//! The catalog templates are compiled into the binary. A template directory
//! can override any of them by file name; templates it does not provide fall
//! back to the embedded copies.
//!
//! Stored catalog text is escaped when it is validated, so autoescaping is
//! off for the catalog templates. The error page is rendered separately with
//! autoescaping on, because its message may carry raw request data.

use axum::http::StatusCode;
use axum::response::Html;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

pub const INDEX: &str = "index.html";
pub const CATEGORY_LIST: &str = "category_list.html";
pub const CATEGORY_DETAIL: &str = "category_detail.html";
pub const CATEGORY_FORM: &str = "category_form.html";
pub const CATEGORY_DELETE: &str = "category_delete.html";
pub const PRODUCT_LIST: &str = "product_list.html";
pub const PRODUCT_DETAIL: &str = "product_detail.html";
pub const PRODUCT_FORM: &str = "product_form.html";
pub const PRODUCT_DELETE: &str = "product_delete.html";

const EMBEDDED: [(&str, &str); 10] = [
    ("layout.html", include_str!("../templates/layout.html")),
    (INDEX, include_str!("../templates/index.html")),
    (CATEGORY_LIST, include_str!("../templates/category_list.html")),
    (CATEGORY_DETAIL, include_str!("../templates/category_detail.html")),
    (CATEGORY_FORM, include_str!("../templates/category_form.html")),
    (CATEGORY_DELETE, include_str!("../templates/category_delete.html")),
    (PRODUCT_LIST, include_str!("../templates/product_list.html")),
    (PRODUCT_DETAIL, include_str!("../templates/product_detail.html")),
    (PRODUCT_FORM, include_str!("../templates/product_form.html")),
    (PRODUCT_DELETE, include_str!("../templates/product_delete.html")),
];

const ERROR_TEMPLATE: &str = include_str!("../templates/error.html");

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },

    #[error("template directory {path:?} is not a directory")]
    Directory { path: PathBuf },

    #[error("failed to read templates from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders catalog pages by template name.
#[derive(Debug)]
pub struct Views {
    tera: Tera,
}

impl Views {
    /// The compiled-in template set.
    pub fn embedded() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED)?;
        Ok(Self::configure(tera))
    }

    /// Templates from `dir` (`*.html`), with embedded fallbacks.
    pub fn from_dir(dir: &Path) -> Result<Self, ViewError> {
        if !dir.is_dir() {
            return Err(ViewError::Directory {
                path: dir.to_path_buf(),
            });
        }
        let io_error = |source: std::io::Error| ViewError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut overrides = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().is_some_and(|ext| ext == "html") {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                overrides.push((path, name));
            }
        }
        debug!(dir = %dir.display(), count = overrides.len(), "loading template overrides");

        let mut views = Self::embedded()?;
        views.tera.add_template_files(overrides)?;
        Ok(views)
    }

    pub fn load(dir: Option<&Path>) -> Result<Self, ViewError> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    fn configure(mut tera: Tera) -> Self {
        tera.autoescape_on(Vec::new());
        tera.register_filter("money", money);
        Self { tera }
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<Html<String>, ViewError> {
        let context = Context::from_serialize(data)?;
        Ok(Html(self.tera.render(template, &context)?))
    }

    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template(template).is_ok()
    }
}

/// `{{ price | money }}`: two decimals.
fn money(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_f64() {
        Some(amount) => Ok(Value::String(format!("{amount:.2}"))),
        None => Err(tera::Error::msg(format!("money filter expects a number, got {value}"))),
    }
}

/// Standalone error page, escaped.
pub fn render_error_page(status: StatusCode, message: &str) -> String {
    let mut context = Context::new();
    context.insert("status", &status.as_u16());
    context.insert("reason", status.canonical_reason().unwrap_or("Error"));
    context.insert("message", message);
    Tera::one_off(ERROR_TEMPLATE, &context, true).unwrap_or_else(|error| {
        tracing::error!(%error, "failed to render error page");
        format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("Error"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_templates_compile() {
        let views = Views::embedded().unwrap();
        for (name, _) in EMBEDDED {
            assert!(views.has_template(name), "{name} missing");
        }
    }

    #[test]
    fn money_formats_two_decimals() {
        let args = HashMap::new();
        assert_eq!(money(&json!(2.5), &args).unwrap(), json!("2.50"));
        assert_eq!(money(&json!(4), &args).unwrap(), json!("4.00"));
        assert!(money(&json!("x"), &args).is_err());
    }

    #[test]
    fn catalog_text_is_not_escaped_twice() {
        let views = Views::embedded().unwrap();
        let page = views
            .render(
                CATEGORY_LIST,
                &json!({
                    "title": "Category List",
                    "categories": [{"name": "Fish &amp; Chips", "url": "/store/category/1"}],
                }),
            )
            .unwrap();
        assert!(page.0.contains("Fish &amp; Chips"));
        assert!(!page.0.contains("&amp;amp;"));
    }

    #[test]
    fn error_page_escapes_its_message() {
        let page = render_error_page(StatusCode::NOT_FOUND, "<script>");
        assert!(page.contains("404"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn directory_overrides_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(INDEX),
            "custom home {{ category_count }}",
        )
        .unwrap();
        let views = Views::from_dir(dir.path()).unwrap();
        let page = views
            .render(INDEX, &json!({"category_count": 3}))
            .unwrap();
        assert_eq!(page.0, "custom home 3");
        assert!(views.has_template(PRODUCT_LIST));
    }

    #[test]
    fn missing_directory_is_rejected() {
        let error = Views::from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(error, ViewError::Directory { .. }));
    }
}
