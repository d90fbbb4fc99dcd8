//! Mapping of handler errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stax_core::DocsError;

pub const NOT_FOUND_BODY: &str = "404 Not Found";
pub const SERVER_ERROR_BODY: &str = "500 Internal Server Error";

/// Handler error: 404 for unknown paths, 500 for documents that cannot be exported
#[derive(Debug)]
pub struct ApiError(pub DocsError);

impl From<DocsError> for ApiError {
    fn from(err: DocsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            DocsError::NotFound(path) => {
                log::debug!("No document at {}", path);
                (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
            }
            DocsError::MalformedDocument { .. } => {
                log::error!("{}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
            }
        }
    }
}
