//! Error boundary for request handlers.
//!
//! Lower layers report typed errors ([`StoreError`], [`ViewError`]); handlers
//! return [`AppError`], which picks the status code, logs, counts the error
//! and renders the error page. Validation failures and blocked deletes are
//! normal outcomes and never reach this type.

use crate::metrics::METRICS;
use crate::store::StoreError;
use crate::views::{ViewError, render_error_page};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] ViewError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Store(_) => "store",
            AppError::Render(_) => "render",
        }
    }

    /// Text shown to the client. Server-side failures stay generic.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(_) => self.to_string(),
            _ => "Something went wrong while handling this request.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        METRICS.record_error(self.kind());
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "request rejected");
        }
        let body = render_error_page(status, &self.public_message());
        (status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::NotFound("Category").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Store(StoreError::Closed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Store(StoreError::Closed).kind(), "store");
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response = AppError::Store(StoreError::Background("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("500"));
        assert!(!body.contains("secret detail"));
    }

    #[tokio::test]
    async fn not_found_names_the_entity() {
        let response = AppError::NotFound("Product").into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("Product not found"));
    }
}
