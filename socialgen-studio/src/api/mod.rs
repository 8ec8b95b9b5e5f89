//! HTTP handlers outside the page controllers

pub mod health;
pub mod ui;

pub use health::health_routes;
pub use ui::{serve_app_css, serve_index};
