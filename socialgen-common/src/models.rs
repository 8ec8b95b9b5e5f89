//! Domain models shared by the studio
//!
//! Stored content, the insert payload, aggregation dimensions and the
//! transient image artifact returned by the image API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::ColorPalette;
use crate::Error;

/// Social platform a piece of content targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    TikTok,
    Facebook,
    Twitter,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::TikTok,
        Platform::Facebook,
        Platform::Twitter,
        Platform::LinkedIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter",
            Platform::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown platform: {}", s)))
    }
}

/// Format of a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Video,
    Image,
    Text,
    Reel,
    Post,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Video,
        ContentType::Image,
        ContentType::Text,
        ContentType::Reel,
        ContentType::Post,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "Video",
            ContentType::Image => "Image",
            ContentType::Text => "Text",
            ContentType::Reel => "Reel",
            ContentType::Post => "Post",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown content type: {}", s)))
    }
}

/// Persisted unit of generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub platform: Platform,
    pub content_type: ContentType,
    pub industry: String,
    pub tone: String,
    pub body: String,
    pub additional_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a ContentRecord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContentRecord {
    pub platform: Platform,
    pub content_type: ContentType,
    pub industry: String,
    pub tone: String,
    pub body: String,
    pub additional_context: Option<String>,
}

impl NewContentRecord {
    /// Trim text fields and reject blank required ones
    pub fn normalized(self) -> crate::Result<Self> {
        let industry = required("industry", &self.industry)?;
        let tone = required("tone", &self.tone)?;
        let body = required("body", &self.body)?;
        let additional_context = self
            .additional_context
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            platform: self.platform,
            content_type: self.content_type,
            industry,
            tone,
            body,
            additional_context,
        })
    }
}

fn required(field: &str, value: &str) -> crate::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Column a stored-content aggregate groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateDimension {
    Platform,
    ContentType,
    Industry,
    Tone,
}

impl AggregateDimension {
    pub const ALL: [AggregateDimension; 4] = [
        AggregateDimension::Platform,
        AggregateDimension::ContentType,
        AggregateDimension::Industry,
        AggregateDimension::Tone,
    ];

    /// Column name in the content table
    pub fn column(&self) -> &'static str {
        match self {
            AggregateDimension::Platform => "platform",
            AggregateDimension::ContentType => "content_type",
            AggregateDimension::Industry => "industry",
            AggregateDimension::Tone => "tone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AggregateDimension::Platform => "Platform",
            AggregateDimension::ContentType => "Content type",
            AggregateDimension::Industry => "Industry",
            AggregateDimension::Tone => "Tone",
        }
    }
}

/// Equality filters for listing and aggregating stored content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFilter {
    pub platform: Option<Platform>,
    pub content_type: Option<ContentType>,
    pub industry: Option<String>,
    pub tone: Option<String>,
    pub limit: Option<i64>,
}

impl ContentFilter {
    pub fn platform(platform: Platform) -> Self {
        Self {
            platform: Some(platform),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Output language requested for generated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Thai,
    English,
    MixedThaiEnglish,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Thai, Language::English, Language::MixedThaiEnglish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Thai => "Thai",
            Language::English => "English",
            Language::MixedThaiEnglish => "Mixed Thai-English",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown language: {}", s)))
    }
}

/// Image aspect ratio supported by the image API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "ASPECT_1_1")]
    Square,
    #[serde(rename = "ASPECT_16_9")]
    Landscape16x9,
    #[serde(rename = "ASPECT_9_16")]
    Portrait9x16,
    #[serde(rename = "ASPECT_4_3")]
    Standard4x3,
    #[serde(rename = "ASPECT_3_4")]
    Portrait3x4,
    #[serde(rename = "ASPECT_3_2")]
    Landscape3x2,
    #[serde(rename = "ASPECT_2_3")]
    Portrait2x3,
    #[serde(rename = "ASPECT_16_10")]
    Widescreen16x10,
    #[serde(rename = "ASPECT_10_16")]
    Tall10x16,
    #[serde(rename = "ASPECT_3_1")]
    Panorama3x1,
    #[serde(rename = "ASPECT_1_3")]
    VerticalPanorama1x3,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 11] = [
        AspectRatio::Square,
        AspectRatio::Landscape16x9,
        AspectRatio::Portrait9x16,
        AspectRatio::Standard4x3,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait2x3,
        AspectRatio::Widescreen16x10,
        AspectRatio::Tall10x16,
        AspectRatio::Panorama3x1,
        AspectRatio::VerticalPanorama1x3,
    ];

    /// `W:H` form used in forms
    pub fn ratio(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Standard4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Widescreen16x10 => "16:10",
            AspectRatio::Tall10x16 => "10:16",
            AspectRatio::Panorama3x1 => "3:1",
            AspectRatio::VerticalPanorama1x3 => "1:3",
        }
    }

    /// `ASPECT_W_H` form used on the wire
    pub fn wire_name(&self) -> String {
        format!("ASPECT_{}", self.ratio().replace(':', "_"))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Landscape16x9 => "Landscape (16:9)",
            AspectRatio::Portrait9x16 => "Portrait (9:16)",
            AspectRatio::Standard4x3 => "Standard (4:3)",
            AspectRatio::Portrait3x4 => "Portrait (3:4)",
            AspectRatio::Landscape3x2 => "Landscape (3:2)",
            AspectRatio::Portrait2x3 => "Portrait (2:3)",
            AspectRatio::Widescreen16x10 => "Widescreen (16:10)",
            AspectRatio::Tall10x16 => "Tall (10:16)",
            AspectRatio::Panorama3x1 => "Panorama (3:1)",
            AspectRatio::VerticalPanorama1x3 => "Vertical Panorama (1:3)",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    /// Accepts `16:9` as well as `ASPECT_16_9`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let ratio = wanted
            .strip_prefix("ASPECT_")
            .map(|r| r.replace('_', ":"))
            .unwrap_or_else(|| wanted.to_string());
        AspectRatio::ALL
            .into_iter()
            .find(|a| a.ratio() == ratio)
            .ok_or_else(|| Error::InvalidInput(format!("Unsupported aspect ratio: {}", s)))
    }
}

/// Image model generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageModel {
    #[serde(rename = "V_1")]
    V1,
    #[serde(rename = "V_1_TURBO")]
    V1Turbo,
    #[serde(rename = "V_2")]
    V2,
    #[default]
    #[serde(rename = "V_2_TURBO")]
    V2Turbo,
}

impl ImageModel {
    pub const ALL: [ImageModel; 4] = [
        ImageModel::V1,
        ImageModel::V1Turbo,
        ImageModel::V2,
        ImageModel::V2Turbo,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            ImageModel::V1 => "V_1",
            ImageModel::V1Turbo => "V_1_TURBO",
            ImageModel::V2 => "V_2",
            ImageModel::V2Turbo => "V_2_TURBO",
        }
    }

    /// Style types and color palettes are only honored by V_2 models
    pub fn supports_style_and_palette(&self) -> bool {
        matches!(self, ImageModel::V2 | ImageModel::V2Turbo)
    }
}

impl FromStr for ImageModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ImageModel::ALL
            .into_iter()
            .find(|m| m.wire_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown image model: {}", s)))
    }
}

/// Visual style hint for the image API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStyle {
    Auto,
    General,
    Realistic,
    Design,
    #[serde(rename = "RENDER_3D")]
    Render3D,
    Anime,
}

impl ImageStyle {
    pub const ALL: [ImageStyle; 6] = [
        ImageStyle::Auto,
        ImageStyle::General,
        ImageStyle::Realistic,
        ImageStyle::Design,
        ImageStyle::Render3D,
        ImageStyle::Anime,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            ImageStyle::Auto => "AUTO",
            ImageStyle::General => "GENERAL",
            ImageStyle::Realistic => "REALISTIC",
            ImageStyle::Design => "DESIGN",
            ImageStyle::Render3D => "RENDER_3D",
            ImageStyle::Anime => "ANIME",
        }
    }
}

impl FromStr for ImageStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ImageStyle::ALL
            .into_iter()
            .find(|st| st.wire_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown image style: {}", s)))
    }
}

/// One image returned by the image API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub resolution: Option<String>,
    pub seed: Option<i64>,
    pub is_image_safe: Option<bool>,
}

/// Generated images plus the parameters that produced them
///
/// Transient unless the user saves it. `images` is never empty for an
/// artifact handed back by a generation client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub style: Option<ImageStyle>,
    pub model: ImageModel,
    pub color_palette: ColorPalette,
    pub generated_at: DateTime<Utc>,
    pub images: Vec<GeneratedImage>,
}

impl ImageArtifact {
    /// Parameters worth keeping next to a saved artifact, as JSON
    pub fn parameters_json(&self) -> String {
        serde_json::json!({
            "prompt": self.prompt,
            "aspect_ratio": self.aspect_ratio.wire_name(),
            "style": self.style.map(|s| s.wire_name()),
            "model": self.model.wire_name(),
            "color_palette": self.color_palette,
            "generated_at": self.generated_at,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!("linkedin".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert_eq!(" TikTok ".parse::<Platform>().unwrap(), Platform::TikTok);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_display_round_trips() {
        for p in Platform::ALL {
            assert_eq!(p.to_string().parse::<Platform>().unwrap(), p);
        }
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("post".parse::<ContentType>().unwrap(), ContentType::Post);
        assert!("podcast".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_new_record_normalized_trims_and_rejects_blank() {
        let record = NewContentRecord {
            platform: Platform::LinkedIn,
            content_type: ContentType::Post,
            industry: "  Retail ".to_string(),
            tone: "Professional".to_string(),
            body: "Hello world\n".to_string(),
            additional_context: Some("   ".to_string()),
        };
        let normalized = record.clone().normalized().unwrap();
        assert_eq!(normalized.industry, "Retail");
        assert_eq!(normalized.body, "Hello world");
        assert_eq!(normalized.additional_context, None);

        let blank = NewContentRecord {
            body: " ".to_string(),
            ..record
        };
        assert!(matches!(blank.normalized(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_aspect_ratio_forms() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape16x9);
        assert_eq!("ASPECT_10_16".parse::<AspectRatio>().unwrap(), AspectRatio::Tall10x16);
        assert_eq!(AspectRatio::Panorama3x1.wire_name(), "ASPECT_3_1");
        assert!("5:4".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_wire_names_match_serde() {
        assert_eq!(
            serde_json::to_value(AspectRatio::Widescreen16x10).unwrap(),
            serde_json::json!(AspectRatio::Widescreen16x10.wire_name())
        );
        assert_eq!(
            serde_json::to_value(ImageModel::V2Turbo).unwrap(),
            serde_json::json!("V_2_TURBO")
        );
        assert_eq!(
            serde_json::to_value(ImageStyle::Render3D).unwrap(),
            serde_json::json!("RENDER_3D")
        );
    }

    #[test]
    fn test_only_v2_models_take_style_and_palette() {
        assert!(ImageModel::V2.supports_style_and_palette());
        assert!(ImageModel::V2Turbo.supports_style_and_palette());
        assert!(!ImageModel::V1Turbo.supports_style_and_palette());
    }
}
