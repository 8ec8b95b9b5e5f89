//! Image creator page
//!
//! Actions:
//! - `concept`: text model writes a creative brief; its image prompt and
//!   negative prompt are pulled out and prefilled into the form
//! - `describe`: image model describes the uploaded reference image
//! - `generate`: palette is validated first, then one generate (or remix,
//!   when a reference image is attached) call
//! - `save`: stores the generated artifact as an `Image` content record

use axum::async_trait;
use socialgen_common::models::{
    AspectRatio, ContentType, ImageArtifact, ImageModel, ImageStyle, NewContentRecord, Platform,
};
use socialgen_common::ColorPalette;
use tracing::info;

use super::layout::{alert, escape, escape_attr, hidden, options, text_area, text_input, AlertKind};
use super::{report, FormInput, Page, PageId, PageOutcome};
use crate::error::PageError;
use crate::generation::prompts::{self, ImageBrief};
use crate::generation::{ImageRequest, TextRequest, MAX_IMAGES_PER_REQUEST};
use crate::AppState;

const REFERENCE_FIELD: &str = "reference_image";

pub struct ImagesPage;

#[async_trait]
impl Page for ImagesPage {
    fn id(&self) -> PageId {
        PageId::Images
    }

    async fn render(&self, _state: &AppState, input: &FormInput) -> PageOutcome {
        PageOutcome::Render(image_form(input, ""))
    }

    async fn handle_submit(&self, state: &AppState, input: &FormInput) -> PageOutcome {
        let action = input.action().unwrap_or("generate");
        let result = match action {
            "concept" => concept(state, input).await,
            "describe" => describe(state, input).await,
            "generate" => generate(state, input).await,
            "save" => match save(state, input).await {
                Ok(id) => return PageOutcome::Redirect(format!("/analytics?saved={}", id)),
                Err(err) => Err(err),
            },
            other => Err(PageError::InvalidInput(format!("Unknown action: {}", other))),
        };

        match result {
            Ok((form_input, below)) => PageOutcome::Render(image_form(&form_input, &below)),
            Err(err) => {
                let message = report(self.id(), action, &err);
                PageOutcome::Render(image_form(input, &message))
            }
        }
    }
}

/// Form state to re-render plus the HTML shown below the form
type ActionResult = Result<(FormInput, String), PageError>;

fn palette(input: &FormInput) -> Result<ColorPalette, PageError> {
    Ok(ColorPalette::parse(input.value("color_palette"))?)
}

async fn concept(state: &AppState, input: &FormInput) -> ActionResult {
    let color_palette = palette(input)?;
    let brief = ImageBrief {
        platform: input.parse("platform", "Platform")?.unwrap_or(Platform::Instagram),
        concept: input.require("concept", "Image concept")?.to_string(),
        purpose: input.get("purpose").map(str::to_string),
        visual_style: input.get("visual_style").map(str::to_string),
        color_palette,
        reference_notes: input
            .value("reference_notes")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    };

    let request = TextRequest::new(prompts::image_concept_prompt(&brief)).with_temperature(0.7);
    let concept_text = state
        .text
        .generate_text(&request)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut next = input.clone();
    let mut below = String::new();
    match prompts::extract_image_prompt(&concept_text) {
        Some(prompt) => {
            next.set("prompt", prompt);
            if let Some(negative) = prompts::extract_negative_prompt(&concept_text) {
                next.set("negative_prompt", negative);
            }
            below.push_str(&alert(
                AlertKind::Success,
                "Concept ready. The image prompt has been filled in below the brief.",
            ));
        }
        None => below.push_str(&alert(
            AlertKind::Error,
            "The brief has no Ideogram Prompt section. Generate the concept again or write a prompt yourself.",
        )),
    }
    below.push_str(&format!(
        "<section class=\"results\"><h2>Creative brief</h2><pre class=\"brief\">{}</pre></section>",
        escape(&concept_text)
    ));

    info!(platform = %brief.platform, palette = brief.color_palette.len(), "Generated image concept");
    Ok((next, below))
}

async fn describe(state: &AppState, input: &FormInput) -> ActionResult {
    let image = input
        .file(REFERENCE_FIELD)
        .ok_or_else(|| PageError::InvalidInput("Choose a reference image to describe".to_string()))?;

    let descriptions = state.images.describe_image(image).await?;

    let mut next = input.clone();
    next.set("reference_notes", descriptions.join("\n"));
    if input.get("prompt").is_none() {
        if let Some(first) = descriptions.first() {
            next.set("prompt", first.clone());
        }
    }

    let items: String = descriptions
        .iter()
        .map(|d| format!("<li>{}</li>", escape(d)))
        .collect();
    let below = format!(
        "<section class=\"results\"><h2>Reference image description</h2><ul>{}</ul></section>",
        items
    );

    info!(file_name = %image.file_name, descriptions = descriptions.len(), "Described reference image");
    Ok((next, below))
}

/// Build the image request from the form
///
/// The palette is checked before anything else so an invalid color never
/// reaches a generation call.
pub fn parse_image_request(input: &FormInput) -> Result<ImageRequest, PageError> {
    let color_palette = palette(input)?;
    let prompt = input.require("prompt", "Image prompt")?.to_string();

    let num_images = input
        .parse::<u8>("num_images", "Number of images")?
        .unwrap_or(1)
        .clamp(1, MAX_IMAGES_PER_REQUEST);
    let image_weight = input
        .parse::<u8>("image_weight", "Reference weight")?
        .unwrap_or(50)
        .clamp(1, 100);

    Ok(ImageRequest {
        prompt,
        negative_prompt: input.get("negative_prompt").map(str::to_string),
        aspect_ratio: input.parse("aspect_ratio", "Aspect ratio")?.unwrap_or_default(),
        model: input.parse("model", "Model")?.unwrap_or_default(),
        style: input.parse("style", "Style")?,
        color_palette,
        num_images,
        reference: input.file(REFERENCE_FIELD).cloned(),
        image_weight,
    })
}

async fn generate(state: &AppState, input: &FormInput) -> ActionResult {
    let request = parse_image_request(input)?;
    let artifact = state.images.generate_image(&request).await?;

    info!(
        model = artifact.model.wire_name(),
        images = artifact.images.len(),
        remix = request.reference.is_some(),
        "Generated images"
    );

    Ok((input.clone(), artifact_view(&artifact, input)))
}

fn artifact_view(artifact: &ImageArtifact, input: &FormInput) -> String {
    let gallery: String = artifact
        .images
        .iter()
        .map(|image| {
            let caption = match (&image.resolution, image.seed) {
                (Some(resolution), Some(seed)) => format!("{} · seed {}", resolution, seed),
                (Some(resolution), None) => resolution.clone(),
                (None, Some(seed)) => format!("seed {}", seed),
                (None, None) => String::new(),
            };
            format!(
                "<figure><a href=\"{url}\" target=\"_blank\" rel=\"noopener\"><img src=\"{url}\" alt=\"Generated image\"></a><figcaption>{caption}</figcaption></figure>",
                url = escape_attr(&image.url),
                caption = escape(&caption),
            )
        })
        .collect();

    let artifact_json = serde_json::to_string(artifact).unwrap_or_default();
    let platform = input.get("platform").unwrap_or(Platform::Instagram.as_str());

    format!(
        r#"<section class="results">
<h2>Generated images</h2>
<div class="gallery">{gallery}</div>
<form method="post" action="/images" class="panel">
{artifact}
<div class="grid">
<label>Platform<select name="platform">{platforms}</select></label>
{industry}
{tone}
</div>
<button type="submit" name="action" value="save">Save images</button>
</form>
</section>"#,
        gallery = gallery,
        artifact = hidden("artifact", &artifact_json),
        platforms = options(Platform::ALL.iter().map(|p| (p.as_str(), p.as_str())), Some(platform)),
        industry = text_input("industry", "Industry", input.value("industry"), "e.g. Coffee shop"),
        tone = text_input("tone", "Tone", input.value("tone"), "e.g. Minimal, Playful"),
    )
}

/// Content record for a saved image artifact
///
/// The body lists the image URLs one per line; the generation parameters go
/// into `additional_context` as JSON. The palette was normalized when the
/// artifact was deserialized.
pub fn artifact_record(
    artifact: &ImageArtifact,
    platform: Platform,
    industry: &str,
    tone: &str,
) -> Result<NewContentRecord, PageError> {
    if artifact.images.is_empty() {
        return Err(PageError::InvalidInput("There are no images to save".to_string()));
    }
    let body = artifact
        .images
        .iter()
        .map(|i| i.url.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(NewContentRecord {
        platform,
        content_type: ContentType::Image,
        industry: industry.to_string(),
        tone: tone.to_string(),
        body,
        additional_context: Some(artifact.parameters_json()),
    }
    .normalized()?)
}

async fn save(state: &AppState, input: &FormInput) -> Result<i64, PageError> {
    let raw = input.require("artifact", "Generated images")?;
    let artifact: ImageArtifact = serde_json::from_str(raw)
        .map_err(|e| PageError::InvalidInput(format!("Generated images could not be read: {}", e)))?;
    let platform: Platform = input
        .parse("platform", "Platform")?
        .ok_or_else(|| PageError::InvalidInput("Platform is required".to_string()))?;

    let record = artifact_record(&artifact, platform, input.value("industry"), input.value("tone"))?;
    let id = state.store.save(&record).await?;
    info!(id, images = artifact.images.len(), "Saved image artifact");
    Ok(id)
}

fn image_form(input: &FormInput, below: &str) -> String {
    let platform = input.get("platform").unwrap_or(Platform::Instagram.as_str());
    let aspect_default = AspectRatio::default().ratio();
    let model_default = ImageModel::default().wire_name();

    let aspect_ratios = options(
        AspectRatio::ALL.iter().map(|a| (a.ratio(), a.label())),
        Some(input.get("aspect_ratio").unwrap_or(aspect_default)),
    );
    let models = options(
        ImageModel::ALL.iter().map(|m| (m.wire_name(), m.wire_name())),
        Some(input.get("model").unwrap_or(model_default)),
    );
    let styles = options(
        std::iter::once(("", "None")).chain(ImageStyle::ALL.iter().map(|s| (s.wire_name(), s.wire_name()))),
        Some(input.value("style")),
    );
    let counts = options(
        [("1", "1"), ("2", "2"), ("3", "3"), ("4", "4")],
        Some(input.get("num_images").unwrap_or("1")),
    );

    format!(
        r#"<h1>{title}</h1>
<form method="post" action="/images" enctype="multipart/form-data" class="panel">
<h2>1. Concept</h2>
<div class="grid">
<label>Platform<select name="platform">{platforms}</select></label>
{purpose}
{visual_style}
</div>
{concept}
{palette}
<p class="muted">Colors as #RRGGBB, #RGB or names, separated by commas. The first color weighs most.</p>
<button type="submit" name="action" value="concept">Generate concept</button>

<h2>2. Reference image (optional)</h2>
<label>Image<input type="file" name="{reference_field}" accept="image/*"></label>
<label>Reference weight (1-100)<input type="number" name="image_weight" min="1" max="100" value="{image_weight}"></label>
<button type="submit" name="action" value="describe">Describe image</button>
{reference_notes}

<h2>3. Image</h2>
{prompt}
{negative_prompt}
<div class="grid">
<label>Aspect ratio<select name="aspect_ratio">{aspect_ratios}</select></label>
<label>Model<select name="model">{models}</select></label>
<label>Style (V_2 models)<select name="style">{styles}</select></label>
<label>Images<select name="num_images">{counts}</select></label>
</div>
<button type="submit" name="action" value="generate">Generate images</button>
</form>
{below}"#,
        title = PageId::Images.title(),
        platforms = options(Platform::ALL.iter().map(|p| (p.as_str(), p.as_str())), Some(platform)),
        purpose = text_input("purpose", "Purpose", input.value("purpose"), "e.g. Product launch"),
        visual_style = text_input("visual_style", "Visual style", input.value("visual_style"), "e.g. Minimal, bright"),
        concept = text_area("concept", "Image concept", input.value("concept"), 3),
        palette = text_input("color_palette", "Color palette", input.value("color_palette"), "#FF5733, navy, #fff"),
        reference_field = REFERENCE_FIELD,
        image_weight = escape_attr(input.get("image_weight").unwrap_or("50")),
        reference_notes = text_area("reference_notes", "Reference notes", input.value("reference_notes"), 3),
        prompt = text_area("prompt", "Image prompt", input.value("prompt"), 4),
        negative_prompt = text_area("negative_prompt", "Negative prompt (optional)", input.value("negative_prompt"), 2),
        aspect_ratios = aspect_ratios,
        models = models,
        styles = styles,
        counts = counts,
        below = below,
    )
}
