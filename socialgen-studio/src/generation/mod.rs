//! Generation clients
//!
//! Thin request/response wrappers around the text model (Gemini) and the
//! image model (Ideogram). Every call is exactly one outbound HTTP request:
//! no retry, no streaming, no partial results. A call either returns a
//! non-empty payload or a [`GenerationError`] carrying the upstream message.

use serde_json::Value;
use socialgen_common::models::{AspectRatio, ImageArtifact, ImageModel, ImageStyle};
use socialgen_common::ColorPalette;
use std::time::Duration;
use thiserror::Error;

pub mod gemini;
pub mod ideogram;
pub mod prompts;

pub use gemini::GeminiClient;
pub use ideogram::IdeogramClient;

const USER_AGENT: &str = concat!("SocialGen-Studio/", env!("CARGO_PKG_VERSION"));

/// Most images the image API returns for one request
pub const MAX_IMAGES_PER_REQUEST: u8 = 4;

/// Generation client errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("The service returned no content: {0}")]
    EmptyResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Prompt for the text model
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub prompt: String,
    /// Number of alternative completions requested in the same call
    pub candidate_count: u8,
    pub temperature: Option<f32>,
    /// Ask the model for a JSON document instead of prose
    pub json_response: bool,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            candidate_count: 1,
            temperature: None,
            json_response: false,
        }
    }

    pub fn with_candidates(mut self, count: u8) -> Self {
        self.candidate_count = count.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Uploaded image handed to remix or describe
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parameters for one image generation call
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub model: ImageModel,
    pub style: Option<ImageStyle>,
    pub color_palette: ColorPalette,
    /// Clamped to 1..=4 when the request is built
    pub num_images: u8,
    /// When present the call remixes this image instead of generating fresh
    pub reference: Option<ReferenceImage>,
    /// Reference influence, 1..=100
    pub image_weight: u8,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            aspect_ratio: AspectRatio::default(),
            model: ImageModel::default(),
            style: None,
            color_palette: ColorPalette::new(),
            num_images: 1,
            reference: None,
            image_weight: 50,
        }
    }
}

/// Text model seam
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate `candidate_count` alternatives for a prompt
    ///
    /// The returned list is never empty.
    async fn generate_text(&self, request: &TextRequest) -> Result<Vec<String>, GenerationError>;
}

/// Image model seam
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate (or remix) images; the artifact always carries one or more images
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageArtifact, GenerationError>;

    /// Describe an uploaded image as candidate prompts (never empty)
    async fn describe_image(&self, image: &ReferenceImage) -> Result<Vec<String>, GenerationError>;
}

/// Build the shared HTTP client used by both generation clients
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, GenerationError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| GenerationError::NetworkError(e.to_string()))
}

/// Turn a non-success response into an `ApiError` with the upstream message
pub(crate) async fn api_error(response: reqwest::Response) -> GenerationError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GenerationError::ApiError(status, upstream_message(&body))
}

/// Best human-readable message from an upstream error body
///
/// Understands `{"error": {"message": ...}}`, `{"error": "..."}` and
/// `{"message": ...}`; anything else is returned as-is.
pub fn upstream_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("error").filter(|e| e.is_string()))
            .or_else(|| json.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_nested_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(upstream_message(body), "API key not valid");
    }

    #[test]
    fn test_upstream_message_flat_forms() {
        assert_eq!(upstream_message(r#"{"error": "quota exceeded"}"#), "quota exceeded");
        assert_eq!(upstream_message(r#"{"message": "bad prompt"}"#), "bad prompt");
    }

    #[test]
    fn test_upstream_message_plain_text() {
        assert_eq!(upstream_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(upstream_message(""), "no response body");
    }

    #[test]
    fn test_text_request_candidates_at_least_one() {
        assert_eq!(TextRequest::new("x").with_candidates(0).candidate_count, 1);
        assert_eq!(TextRequest::new("x").with_candidates(3).candidate_count, 3);
    }
}
