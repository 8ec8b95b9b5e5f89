//! # SocialGen Common Library
//!
//! Shared code for the SocialGen studio including:
//! - Content and image domain models
//! - Color validation and palette normalization
//! - Startup configuration resolution
//! - Common error type

pub mod color;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use color::{validate_color, ColorPalette, InvalidFormat, NormalizedColor};
pub use error::{Error, Result};
