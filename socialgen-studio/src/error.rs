//! Error types for socialgen-studio
//!
//! [`PageError`] is everything a page controller can hit while handling a
//! submission. It never escapes as an HTTP error: controllers render it
//! inline next to the form. [`RequestError`] covers requests that never
//! reach a controller (unknown page, unreadable form body).

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use socialgen_common::InvalidFormat;
use thiserror::Error;

use crate::db::StorageError;
use crate::generation::GenerationError;
use crate::pages::layout;

/// Failure inside a page controller
#[derive(Debug, Error)]
pub enum PageError {
    /// Missing or malformed form field
    #[error("{0}")]
    InvalidInput(String),

    /// Color rejected by the validator
    #[error(transparent)]
    Color(#[from] InvalidFormat),

    /// Generation API call failed
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Database call failed
    #[error("Could not access saved content: {0}")]
    Storage(#[from] StorageError),
}

impl From<socialgen_common::Error> for PageError {
    fn from(err: socialgen_common::Error) -> Self {
        match err {
            socialgen_common::Error::InvalidInput(msg) => PageError::InvalidInput(msg),
            other => PageError::InvalidInput(other.to_string()),
        }
    }
}

impl PageError {
    /// Short category name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PageError::InvalidInput(_) => "invalid_input",
            PageError::Color(_) => "invalid_color",
            PageError::Generation(_) => "generation",
            PageError::Storage(_) => "storage",
        }
    }

    /// User input problems are re-prompted rather than reported as failures
    pub fn is_user_error(&self) -> bool {
        matches!(self, PageError::InvalidInput(_) | PageError::Color(_))
    }
}

/// Request rejected before any page controller runs
#[derive(Debug, Error)]
pub enum RequestError {
    /// Unknown page slug (404)
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Unreadable form body (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, title) = match &self {
            RequestError::NotFound(_) => (StatusCode::NOT_FOUND, "Page not found"),
            RequestError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        };
        let body = format!(
            "<h2>{}</h2>{}<p><a href=\"/content\">Back to the studio</a></p>",
            title,
            layout::alert(layout::AlertKind::Error, &self.to_string())
        );
        (status, Html(layout::page_shell(None, title, &body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_invalid_input_keeps_message() {
        let err: PageError = socialgen_common::Error::InvalidInput("industry must not be empty".into()).into();
        assert_eq!(err.to_string(), "industry must not be empty");
        assert!(err.is_user_error());
    }

    #[test]
    fn test_color_error_message() {
        let err: PageError = socialgen_common::validate_color("notacolor").unwrap_err().into();
        assert_eq!(err.kind(), "invalid_color");
        assert!(err.to_string().contains("notacolor"));
    }

    #[test]
    fn test_not_found_status() {
        let response = RequestError::NotFound("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
