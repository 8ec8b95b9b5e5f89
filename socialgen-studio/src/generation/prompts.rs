//! Prompt building and response post-processing
//!
//! Everything here is pure string work: the page controllers build a
//! prompt, hand it to a generation client, and use the helpers below to
//! pull structured pieces back out of the model's prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use socialgen_common::models::{ContentType, Language, Platform};
use socialgen_common::ColorPalette;
use std::collections::HashSet;

/// Variations requested for one content brief
pub const DEFAULT_VARIATIONS: u8 = 3;

/// Inputs for social media copy
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBrief {
    pub platform: Platform,
    pub content_type: ContentType,
    pub industry: String,
    pub tone: String,
    pub language: Language,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub additional_context: Option<String>,
    /// Free-form hashtag hints, e.g. `coffee, #morning`
    pub hashtag_hints: Option<String>,
    /// Bodies of saved posts shown to the model as style examples
    pub reference_examples: Vec<String>,
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Thai => "Generate the content in Thai language only.",
        Language::English => "Generate the content in English language only.",
        Language::MixedThaiEnglish => {
            "Generate the content in a mix of Thai and English languages, with Thai being the primary language."
        }
    }
}

fn platform_guidance(platform: Platform) -> &'static str {
    match platform {
        Platform::Instagram => "Lead with a strong visual hook, keep paragraphs short and close with a call to action.",
        Platform::TikTok => "Write for a short vertical video: a punchy opening line, an on-screen text idea and a trending-style caption.",
        Platform::Facebook => "Write conversationally and invite comments or shares.",
        Platform::Twitter => "Stay under 280 characters per post.",
        Platform::LinkedIn => "Keep it professional and insight-led, suitable for a business audience.",
    }
}

/// Prompt for the content page
pub fn content_prompt(brief: &ContentBrief) -> String {
    let mut prompt = String::new();
    prompt.push_str(language_instruction(brief.language));
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Generate social media content for {} as a {}.\n",
        brief.platform, brief.content_type
    ));
    prompt.push_str(&format!("Industry: {}\n", brief.industry.trim()));
    prompt.push_str(&format!("Tone of voice: {}\n", brief.tone.trim()));
    prompt.push_str(platform_guidance(brief.platform));
    prompt.push('\n');

    if let Some(name) = non_blank(&brief.product_name) {
        prompt.push_str(&format!("\nProduct: {}\n", name));
        if let Some(description) = non_blank(&brief.product_description) {
            prompt.push_str(&format!("Product description: {}\n", description));
        }
    }
    if let Some(context) = non_blank(&brief.additional_context) {
        prompt.push_str(&format!("\nAdditional context: {}\n", context));
    }
    match non_blank(&brief.hashtag_hints) {
        Some(hints) => prompt.push_str(&format!("\nInclude relevant hashtags based on: {}\n", hints)),
        None => prompt.push_str("\nEnd with a few relevant hashtags.\n"),
    }
    push_reference_content(&mut prompt, brief);

    prompt.push_str(
        "\nMake the content engaging and optimized for the platform. \
         Return only the post text, ready to publish.",
    );
    prompt
}

fn push_reference_content(prompt: &mut String, brief: &ContentBrief) {
    let examples: Vec<&str> = brief
        .reference_examples
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if examples.is_empty() {
        return;
    }

    prompt.push_str(&format!(
        "\nReference content: saved {} posts for {}\n",
        brief.platform,
        brief.industry.trim()
    ));
    for (i, example) in examples.iter().enumerate() {
        prompt.push_str(&format!("Example {}:\n{}\n---\n", i + 1, example));
    }
    prompt.push_str(
        "Learn from these examples to match their style and tone, \
         but create something unique and original.\n",
    );
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

static HASHTAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\p{L}\p{M}\p{N}_&/])#([\p{L}\p{M}\p{N}_]+)").expect("hashtag pattern is valid")
});

/// Hashtags found in generated copy
///
/// Order of first appearance is kept and repeats (case-insensitive) are
/// dropped. Tags made only of digits are ignored.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG
        .captures_iter(text)
        .filter_map(|caps| {
            let tag = caps[1].trim_end_matches('_');
            if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            seen.insert(tag.to_lowercase()).then(|| format!("#{}", tag))
        })
        .collect()
}

/// Inputs for the image concept brief
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBrief {
    pub platform: Platform,
    pub concept: String,
    pub purpose: Option<String>,
    pub visual_style: Option<String>,
    pub color_palette: ColorPalette,
    /// Descriptions of an uploaded reference image, if any
    pub reference_notes: Vec<String>,
}

/// Prompt asking the text model for a structured creative brief
pub fn image_concept_prompt(brief: &ImageBrief) -> String {
    let mut prompt = format!(
        "Create a detailed creative brief for a professional image to be used on {}.\n\n",
        brief.platform
    );
    if let Some(purpose) = non_blank(&brief.purpose) {
        prompt.push_str(&format!("Purpose: {}\n\n", purpose));
    }
    prompt.push_str(&format!("Basic concept: {}\n\n", brief.concept.trim()));
    prompt.push_str(&format!(
        "Visual style preferences: {}\n\n",
        non_blank(&brief.visual_style).unwrap_or("Not specified")
    ));

    if !brief.color_palette.is_empty() {
        let colors: Vec<&str> = brief.color_palette.colors().iter().map(|c| c.as_str()).collect();
        prompt.push_str(&format!(
            "Color palette (most important first): {}. Use these colors prominently.\n\n",
            colors.join(", ")
        ));
    }

    if brief.reference_notes.is_empty() {
        prompt.push_str(
            "No reference images were provided. Describe visual elements precisely: \
             specific colors, objects, layout, lighting and text placement.\n\n",
        );
    } else {
        prompt.push_str("Reference image descriptions (reproduce their key elements faithfully):\n");
        for note in &brief.reference_notes {
            prompt.push_str(&format!("- {}\n", note));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Please structure your response with the following numbered sections:\n\n\
         1. Creative Ideation: Overall concept and creative direction\n\
         2. Content Pillars: Key themes and messages to convey\n\
         3. Mood and Tone: Emotional response and atmosphere\n\
         4. Concept Details: Composition, layout, color scheme and typography\n\
         5. Text Elements: Headline (25 characters or less), sub-headline (50 characters or less) and call to action\n\
         6. Ideogram Prompt: A single detailed paragraph of 200-250 characters for the image model, \
         including any exact text to render\n\
         7. Negative Prompt: Elements to avoid in the image, comma separated\n\n\
         Every section must be present. Write the Ideogram Prompt on one paragraph without bullet points.",
    );
    prompt
}

static IMAGE_PROMPT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t>#*_]*(?:\d+\.\s*)?[*_]*ideogram prompt[*_]*\s*:[*_]*")
        .expect("image prompt header pattern is valid")
});

static NEGATIVE_PROMPT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t>#*_]*(?:\d+\.\s*)?[*_]*negative prompt[*_]*\s*(?:\(optional\))?\s*:[*_]*")
        .expect("negative prompt header pattern is valid")
});

static NEXT_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t>#*_]*(?:\d+\.\s+\S|[*_]*negative prompt[*_]*\s*(?:\(optional\))?\s*:)")
        .expect("section boundary pattern is valid")
});

fn section_body<'a>(text: &'a str, header: &Regex) -> Option<&'a str> {
    let start = header.find(text)?.end();
    let rest = &text[start..];
    // The header line itself may carry the body, so search from the next line.
    let boundary = match rest.find('\n') {
        Some(first_newline) => NEXT_SECTION
            .find(&rest[first_newline + 1..])
            .map(|m| first_newline + 1 + m.start())
            .unwrap_or(rest.len()),
        None => rest.len(),
    };
    Some(&rest[..boundary])
}

/// Drop markdown emphasis and one pair of enclosing quotes
fn strip_decoration(line: &str) -> &str {
    let s = line
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`')
        .trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].trim()
    } else {
        s
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("• "))
}

/// `Ideogram Prompt:` section of a concept brief
///
/// Bullet lines after the prompt paragraph are treated as commentary and
/// dropped, unless the prompt itself is written as a bullet.
pub fn extract_image_prompt(concept: &str) -> Option<String> {
    let body = section_body(concept, &IMAGE_PROMPT_HEADER)?;
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();

    let prose: Vec<&str> = lines
        .iter()
        .filter(|l| bullet_text(l).is_none())
        .map(|l| strip_decoration(l))
        .filter(|l| !l.is_empty())
        .collect();

    let prompt = if prose.is_empty() {
        lines
            .first()
            .and_then(|l| bullet_text(l))
            .map(strip_decoration)
            .unwrap_or_default()
            .to_string()
    } else {
        prose.join(" ")
    };

    (!prompt.is_empty()).then_some(prompt)
}

/// `Negative Prompt:` section of a concept brief, bullets joined by commas
pub fn extract_negative_prompt(concept: &str) -> Option<String> {
    let body = section_body(concept, &NEGATIVE_PROMPT_HEADER)?;
    let parts: Vec<&str> = body
        .lines()
        .map(|l| bullet_text(l).unwrap_or(l))
        .map(strip_decoration)
        .filter(|l| !l.is_empty())
        .collect();

    let negative = parts.join(", ");
    (!negative.is_empty()).then_some(negative)
}

/// Question topics on the client information page
pub const QUESTION_TOPICS: &[(&str, &[&str])] = &[
    (
        "Demographics and Background",
        &[
            "What is likely their age range, life stage, and family status?",
            "Would income level matter for this product or service?",
            "Do they have a specific occupation and would it influence their purchasing behavior?",
        ],
    ),
    (
        "Values and Lifestyle",
        &[
            "What are their personal values, life priorities, or causes they care about?",
            "What is their lifestyle like, and how does it shape their needs?",
            "What deeply held beliefs drive their decisions?",
        ],
    ),
    (
        "Needs and Challenges",
        &[
            "What specific problems, frustrations, or unmet needs are they experiencing?",
            "What struggles do they face that your product/service might solve?",
            "How else might they solve the same problem your product addresses?",
        ],
    ),
    (
        "Goals and Influences",
        &[
            "Who are the Key Opinion Leaders or influencers they are likely to respect and follow?",
            "What do they hope to achieve?",
            "What complementary fields or interests overlap with this niche?",
        ],
    ),
    (
        "Market Trends",
        &[
            "Is there an evolving trend that's rapidly changing the niche landscape?",
            "Are purchases triggered by life stages or seasonal events?",
        ],
    ),
];

/// Topic for questions that match no predefined group
pub const OTHER_TOPIC: &str = "Other Questions";

/// All predefined questions in topic order
pub fn default_questions() -> Vec<&'static str> {
    QUESTION_TOPICS
        .iter()
        .flat_map(|(_, questions)| questions.iter().copied())
        .collect()
}

/// Topic a question belongs to
///
/// A question matches a predefined one when they are equal ignoring case,
/// surrounding whitespace, inner whitespace runs and a trailing `?`.
/// Anything else is filed under [`OTHER_TOPIC`].
pub fn topic_for_question(question: &str) -> &'static str {
    let wanted = question_key(question);
    if wanted.is_empty() {
        return OTHER_TOPIC;
    }
    QUESTION_TOPICS
        .iter()
        .find(|(_, questions)| questions.iter().any(|q| question_key(q) == wanted))
        .map(|(topic, _)| *topic)
        .unwrap_or(OTHER_TOPIC)
}

fn question_key(question: &str) -> String {
    let words = question.split_whitespace().collect::<Vec<_>>().join(" ");
    words.trim_end_matches('?').trim_end().to_lowercase()
}

/// Business described on the client information page
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessProfile {
    pub name: String,
    pub industry: String,
    pub description: String,
}

/// Prompt asking for an audience analysis as JSON
///
/// Questions are numbered from 1 in the order given; the numbers come back
/// as `question_id`.
pub fn audience_prompt(profile: &BusinessProfile, questions: &[String]) -> String {
    let numbered: Vec<String> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect();

    format!(
        "You are an expert social media analyst and market researcher.\n\n\
         BUSINESS:\n\
         - Name: {name}\n\
         - Industry: {industry}\n\
         - Description: {description}\n\n\
         Answer the following questions about this business's target audience:\n\
         {questions}\n\n\
         Only give insights supported by the business information. If there is not enough \
         information to answer a question confidently, say so and give the best cautious answer.\n\n\
         Respond with a JSON object of the form \
         {{\"summary\": string, \"answers\": [{{\"question_id\": number, \"answer\": string}}]}}. \
         The summary has two paragraphs separated by a blank line: first what the business does \
         (products, services, brand style and tone), then who the target audience is and how \
         the business meets their needs.",
        name = profile.name.trim(),
        industry = profile.industry.trim(),
        description = profile.description.trim(),
        questions = numbered.join("\n"),
    )
}

/// One answered audience question
#[derive(Debug, Clone, PartialEq)]
pub struct AudienceAnswer {
    pub topic: &'static str,
    pub question: String,
    pub answer: String,
}

/// Parsed audience analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AudienceAnalysis {
    pub summary: String,
    pub answers: Vec<AudienceAnswer>,
}

impl AudienceAnalysis {
    /// Answers grouped by topic, topics in their display order
    pub fn by_topic(&self) -> Vec<(&'static str, Vec<&AudienceAnswer>)> {
        QUESTION_TOPICS
            .iter()
            .map(|(topic, _)| *topic)
            .chain(std::iter::once(OTHER_TOPIC))
            .map(|topic| {
                let answers: Vec<&AudienceAnswer> =
                    self.answers.iter().filter(|a| a.topic == topic).collect();
                (topic, answers)
            })
            .filter(|(_, answers)| !answers.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    summary: String,
    #[serde(default, alias = "business_context_analysis")]
    answers: Vec<RawAnswer>,
}

#[derive(Debug, Deserialize)]
struct RawAnswer {
    question_id: usize,
    answer: String,
}

/// Parse the model's JSON reply, tolerating a markdown code fence
pub fn parse_audience_analysis(text: &str, questions: &[String]) -> Result<AudienceAnalysis, String> {
    let json = strip_code_fence(text);
    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| format!("analysis was not valid JSON: {}", e))?;

    let answers: Vec<AudienceAnswer> = raw
        .answers
        .into_iter()
        .filter_map(|a| {
            let question = questions.get(a.question_id.checked_sub(1)?)?;
            Some(AudienceAnswer {
                topic: topic_for_question(question),
                question: question.clone(),
                answer: a.answer.trim().to_string(),
            })
        })
        .collect();

    if raw.summary.trim().is_empty() && answers.is_empty() {
        return Err("analysis contained no summary or answers".to_string());
    }

    Ok(AudienceAnalysis {
        summary: raw.summary.trim().to_string(),
        answers,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
