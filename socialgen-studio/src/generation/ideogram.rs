//! Ideogram image client
//!
//! - `POST {base}/generate`: JSON body, fresh images
//! - `POST {base}/remix`: multipart, images derived from a reference upload
//! - `POST {base}/describe`: multipart, prompts describing an upload
//!
//! The key travels in the `Api-Key` header.

use super::{
    api_error, GenerationError, ImageGenerator, ImageRequest, ReferenceImage,
    MAX_IMAGES_PER_REQUEST,
};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use socialgen_common::color::PaletteMember;
use socialgen_common::models::{GeneratedImage, ImageArtifact};
use tracing::{debug, info, warn};

/// Ideogram API client
pub struct IdeogramClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    image_request: ImageRequestPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ImageRequestPayload<'a> {
    prompt: &'a str,
    aspect_ratio: String,
    model: &'static str,
    num_images: u8,
    magic_prompt_option: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_palette: Option<PalettePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_weight: Option<u8>,
}

#[derive(Debug, Serialize)]
struct PalettePayload {
    members: Vec<PaletteMember>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    data: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: Option<String>,
    image_url: Option<String>,
    resolution: Option<String>,
    seed: Option<i64>,
    is_image_safe: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    descriptions: Vec<Description>,
}

#[derive(Debug, Deserialize)]
struct Description {
    text: Option<String>,
}

impl IdeogramClient {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, operation: &str) -> Result<reqwest::Response, GenerationError> {
        let response = builder
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                warn!(operation, error = %e, "Ideogram request failed");
                GenerationError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            warn!(operation, error = %err, "Ideogram returned an error");
            return Err(err);
        }
        Ok(response)
    }
}

/// JSON `image_request` object for generate and remix
fn image_request_payload(request: &ImageRequest) -> ImageRequestPayload<'_> {
    let v2 = request.model.supports_style_and_palette();
    let negative_prompt = request
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let color_palette = (v2 && !request.color_palette.is_empty()).then(|| PalettePayload {
        members: request.color_palette.weighted_members(),
    });

    ImageRequestPayload {
        prompt: request.prompt.trim(),
        aspect_ratio: request.aspect_ratio.wire_name(),
        model: request.model.wire_name(),
        num_images: request.num_images.clamp(1, MAX_IMAGES_PER_REQUEST),
        magic_prompt_option: "AUTO",
        negative_prompt,
        style_type: request.style.filter(|_| v2).map(|s| s.wire_name()),
        color_palette,
        image_weight: request
            .reference
            .as_ref()
            .map(|_| request.image_weight.clamp(1, 100)),
    }
}

fn file_part(image: &ReferenceImage) -> Result<Part, GenerationError> {
    let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
    match image.content_type.as_deref() {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|e| GenerationError::InvalidRequest(format!("bad image content type: {}", e))),
        None => Ok(part),
    }
}

/// Images with a usable URL; entries without one are skipped
fn collect_images(response: GenerateResponse) -> Vec<GeneratedImage> {
    response
        .data
        .into_iter()
        .filter_map(|entry| {
            let url = entry.url.or(entry.image_url).filter(|u| !u.trim().is_empty())?;
            Some(GeneratedImage {
                url,
                resolution: entry.resolution,
                seed: entry.seed,
                is_image_safe: entry.is_image_safe,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl ImageGenerator for IdeogramClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageArtifact, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("prompt is empty".to_string()));
        }

        let payload = image_request_payload(request);
        debug!(
            model = payload.model,
            aspect_ratio = %payload.aspect_ratio,
            num_images = payload.num_images,
            palette = request.color_palette.len(),
            remix = request.reference.is_some(),
            "Requesting Ideogram images"
        );

        let (builder, operation) = match &request.reference {
            None => (
                self.http_client
                    .post(format!("{}/generate", self.base_url))
                    .json(&GenerateBody { image_request: payload }),
                "generate",
            ),
            Some(reference) => {
                let image_request = serde_json::to_string(&payload)
                    .map_err(|e| GenerationError::InvalidRequest(e.to_string()))?;
                let form = Form::new()
                    .text("image_request", image_request)
                    .part("image_file", file_part(reference)?);
                (
                    self.http_client
                        .post(format!("{}/remix", self.base_url))
                        .multipart(form),
                    "remix",
                )
            }
        };

        let response = self.send(builder, operation).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let images = collect_images(parsed);
        if images.is_empty() {
            warn!(operation, "Ideogram returned no image URLs");
            return Err(GenerationError::EmptyResponse(
                "no image URLs in response".to_string(),
            ));
        }

        info!(operation, model = request.model.wire_name(), images = images.len(), "Ideogram images received");

        Ok(ImageArtifact {
            prompt: request.prompt.trim().to_string(),
            aspect_ratio: request.aspect_ratio,
            style: request.style,
            model: request.model,
            color_palette: request.color_palette.clone(),
            generated_at: socialgen_common::time::now(),
            images,
        })
    }

    async fn describe_image(&self, image: &ReferenceImage) -> Result<Vec<String>, GenerationError> {
        if image.bytes.is_empty() {
            return Err(GenerationError::InvalidRequest("image file is empty".to_string()));
        }

        debug!(file_name = %image.file_name, bytes = image.bytes.len(), "Requesting Ideogram description");

        let form = Form::new().part("image_file", file_part(image)?);
        let builder = self
            .http_client
            .post(format!("{}/describe", self.base_url))
            .multipart(form);
        let response = self.send(builder, "describe").await?;

        let parsed: DescribeResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let descriptions: Vec<String> = parsed
            .descriptions
            .into_iter()
            .filter_map(|d| d.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if descriptions.is_empty() {
            return Err(GenerationError::EmptyResponse("no descriptions in response".to_string()));
        }

        info!(descriptions = descriptions.len(), "Ideogram description received");
        Ok(descriptions)
    }
}
