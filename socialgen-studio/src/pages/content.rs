//! Content generator page
//!
//! `generate` turns a brief into several copy variations with one text
//! model call, showing the model saved posts for the same platform and
//! industry as style references. `save` stores the chosen (possibly
//! edited) variation and redirects to analytics.

use axum::async_trait;
use socialgen_common::models::{ContentFilter, ContentType, Language, NewContentRecord, Platform};
use tracing::{info, warn};

use super::layout::{escape, escape_attr, hidden, options, text_area, text_input};
use super::{report, FormInput, Page, PageId, PageOutcome};
use crate::error::PageError;
use crate::generation::prompts::{self, ContentBrief, DEFAULT_VARIATIONS};
use crate::generation::TextRequest;
use crate::AppState;

/// Saved posts shown to the model when the form leaves the count blank
pub const DEFAULT_REFERENCE_COUNT: u8 = 10;

/// Upper bound of the reference count control
pub const MAX_REFERENCE_COUNT: u8 = 20;

pub struct ContentPage;

#[async_trait]
impl Page for ContentPage {
    fn id(&self) -> PageId {
        PageId::Content
    }

    async fn render(&self, _state: &AppState, input: &FormInput) -> PageOutcome {
        PageOutcome::Render(brief_form(input, ""))
    }

    async fn handle_submit(&self, state: &AppState, input: &FormInput) -> PageOutcome {
        match input.action() {
            Some("save") => match save(state, input).await {
                Ok(id) => PageOutcome::Redirect(format!("/analytics?saved={}", id)),
                Err(err) => {
                    let alert = report(self.id(), "save", &err);
                    PageOutcome::Render(brief_form(input, &alert))
                }
            },
            Some("generate") | None => match generate(state, input).await {
                Ok(results) => PageOutcome::Render(brief_form(input, &results)),
                Err(err) => {
                    let alert = report(self.id(), "generate", &err);
                    PageOutcome::Render(brief_form(input, &alert))
                }
            },
            Some(other) => {
                let err = PageError::InvalidInput(format!("Unknown action: {}", other));
                PageOutcome::Render(brief_form(input, &report(self.id(), other, &err)))
            }
        }
    }
}

/// Read and check the brief fields
pub fn parse_brief(input: &FormInput) -> Result<ContentBrief, PageError> {
    let platform: Platform = input
        .parse("platform", "Platform")?
        .ok_or_else(|| PageError::InvalidInput("Platform is required".to_string()))?;
    let content_type: ContentType = input
        .parse("content_type", "Content type")?
        .ok_or_else(|| PageError::InvalidInput("Content type is required".to_string()))?;
    let language: Language = input.parse("language", "Language")?.unwrap_or_default();

    Ok(ContentBrief {
        platform,
        content_type,
        industry: input.require("industry", "Industry")?.to_string(),
        tone: input.require("tone", "Tone")?.to_string(),
        language,
        product_name: input.get("product_name").map(str::to_string),
        product_description: input.get("product_description").map(str::to_string),
        additional_context: input.get("additional_context").map(str::to_string),
        hashtag_hints: input.get("hashtags").map(str::to_string),
        reference_examples: Vec::new(),
    })
}

/// Number of saved posts to learn from, clamped to 1..=20
pub fn parse_reference_count(input: &FormInput) -> Result<u8, PageError> {
    let count: u8 = input
        .parse("reference_count", "Reference content items")?
        .unwrap_or(DEFAULT_REFERENCE_COUNT);
    Ok(count.clamp(1, MAX_REFERENCE_COUNT))
}

/// Bodies of the newest saved posts for the brief's platform and industry
///
/// Image records are skipped since their body is a list of URLs. A storage
/// failure only costs the references; generation goes ahead without them.
async fn reference_examples(state: &AppState, brief: &ContentBrief, count: u8) -> Vec<String> {
    let filter = ContentFilter {
        platform: Some(brief.platform),
        industry: Some(brief.industry.trim().to_string()),
        limit: Some(i64::from(count)),
        ..ContentFilter::default()
    };
    match state.store.list(&filter).await {
        Ok(records) => records
            .into_iter()
            .filter(|r| r.content_type != ContentType::Image)
            .map(|r| r.body)
            .collect(),
        Err(err) => {
            warn!(error = %err, "Could not load reference content");
            Vec::new()
        }
    }
}

async fn generate(state: &AppState, input: &FormInput) -> Result<String, PageError> {
    let mut brief = parse_brief(input)?;
    let count = parse_reference_count(input)?;
    brief.reference_examples = reference_examples(state, &brief, count).await;

    let request = TextRequest::new(prompts::content_prompt(&brief)).with_candidates(DEFAULT_VARIATIONS);
    let variations = state.text.generate_text(&request).await?;

    info!(
        platform = %brief.platform,
        content_type = %brief.content_type,
        references = brief.reference_examples.len(),
        variations = variations.len(),
        "Generated content variations"
    );

    let cards: String = variations
        .iter()
        .enumerate()
        .map(|(i, text)| variation_card(i + 1, text, &brief))
        .collect();

    let learned = match brief.reference_examples.len() {
        0 => "No saved posts for this platform and industry yet.".to_string(),
        1 => "Learned from 1 saved post.".to_string(),
        n => format!("Learned from {} saved posts.", n),
    };

    Ok(format!(
        "<section class=\"results\"><h2>Generated variations</h2><p class=\"muted\">{}</p>{}</section>",
        learned, cards
    ))
}

fn variation_card(number: usize, text: &str, brief: &ContentBrief) -> String {
    let hashtags = prompts::extract_hashtags(text);
    let tags = if hashtags.is_empty() {
        String::new()
    } else {
        format!(
            "<p class=\"hashtags\"><strong>Hashtags:</strong> {}</p>",
            escape(&hashtags.join(" "))
        )
    };

    format!(
        r#"<article class="card">
<h3>Variation {number}</h3>
<form method="post" action="/content">
{platform}{content_type}{industry}{tone}{context}
{body}
{tags}
<button type="submit" name="action" value="save">Save this variation</button>
</form>
</article>"#,
        number = number,
        platform = hidden("platform", brief.platform.as_str()),
        content_type = hidden("content_type", brief.content_type.as_str()),
        industry = hidden("industry", &brief.industry),
        tone = hidden("tone", &brief.tone),
        context = hidden("additional_context", brief.additional_context.as_deref().unwrap_or("")),
        body = text_area("body", "Content (edit before saving if needed)", text, 10),
        tags = tags,
    )
}

async fn save(state: &AppState, input: &FormInput) -> Result<i64, PageError> {
    let platform: Platform = input
        .parse("platform", "Platform")?
        .ok_or_else(|| PageError::InvalidInput("Platform is required".to_string()))?;
    let content_type: ContentType = input
        .parse("content_type", "Content type")?
        .ok_or_else(|| PageError::InvalidInput("Content type is required".to_string()))?;

    let record = NewContentRecord {
        platform,
        content_type,
        industry: input.value("industry").to_string(),
        tone: input.value("tone").to_string(),
        body: input.value("body").to_string(),
        additional_context: input.get("additional_context").map(str::to_string),
    }
    .normalized()?;

    let id = state.store.save(&record).await?;
    info!(id, platform = %record.platform, "Saved generated content");
    Ok(id)
}

fn brief_form(input: &FormInput, below: &str) -> String {
    let platforms = options(
        Platform::ALL.iter().map(|p| (p.as_str(), p.as_str())),
        input.get("platform"),
    );
    let content_types = options(
        ContentType::ALL.iter().map(|t| (t.as_str(), t.as_str())),
        input.get("content_type"),
    );
    let languages = options(
        Language::ALL.iter().map(|l| (l.as_str(), l.as_str())),
        Some(input.get("language").unwrap_or(Language::default().as_str())),
    );
    let reference_count = input
        .get("reference_count")
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_REFERENCE_COUNT.to_string());

    format!(
        r#"<h1>{title}</h1>
<p class="muted">Describe the post and we'll write {variations} variations to choose from.</p>
<form method="post" action="/content" class="panel">
<div class="grid">
<label>Platform<select name="platform">{platforms}</select></label>
<label>Content type<select name="content_type">{content_types}</select></label>
<label>Language<select name="language">{languages}</select></label>
{industry}
{tone}
{product_name}
</div>
{product_description}
{additional_context}
{hashtags}
<fieldset>
<legend>AI learning settings</legend>
<label>Reference content items (1-{max_references})<input type="number" name="reference_count" min="1" max="{max_references}" value="{reference_count}"></label>
<p class="muted">Saved posts for the same platform and industry are shown to the model as style examples.</p>
</fieldset>
<button type="submit" name="action" value="generate">Generate content</button>
</form>
{below}"#,
        title = PageId::Content.title(),
        variations = DEFAULT_VARIATIONS,
        platforms = platforms,
        content_types = content_types,
        languages = languages,
        industry = text_input("industry", "Industry", input.value("industry"), "e.g. Coffee shop"),
        tone = text_input("tone", "Tone", input.value("tone"), "e.g. Friendly, Professional"),
        product_name = text_input("product_name", "Product (optional)", input.value("product_name"), ""),
        product_description = text_area(
            "product_description",
            "Product description (optional)",
            input.value("product_description"),
            3
        ),
        additional_context = text_area(
            "additional_context",
            "Additional context (optional)",
            input.value("additional_context"),
            3
        ),
        hashtags = text_input("hashtags", "Hashtag ideas (optional)", input.value("hashtags"), "coffee, morning"),
        max_references = MAX_REFERENCE_COUNT,
        reference_count = escape_attr(&reference_count),
        below = below,
    )
}
