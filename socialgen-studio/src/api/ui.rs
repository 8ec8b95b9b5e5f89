//! Static asset routes

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

const APP_CSS: &str = include_str!("../ui/app.css");

/// GET /
///
/// The studio opens on the content generator
pub async fn serve_index() -> Redirect {
    Redirect::to("/content")
}

/// GET /static/app.css
pub async fn serve_app_css() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        APP_CSS,
    )
        .into_response()
}
