//! socialgen-studio library
//!
//! Web studio for social media content: copy generation with a text model,
//! image generation with an image model, audience analysis and analytics
//! over saved content.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod generation;
pub mod pages;

use db::ContentStore;
use generation::{ImageGenerator, TextGenerator};

/// Largest accepted request body (reference image uploads)
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Saved content
    pub store: ContentStore,
    /// Text model client
    pub text: Arc<dyn TextGenerator>,
    /// Image model client
    pub images: Arc<dyn ImageGenerator>,
    /// Server start, for the health endpoint
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(
        store: ContentStore,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            store,
            text,
            images,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let pages = Router::new().route("/:page", get(pages::show_page).post(pages::submit_page));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.css", get(api::serve_app_css))
        .merge(api::health_routes());

    Router::new()
        .merge(public)
        .merge(pages)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
