//! Client information page
//!
//! Describes a business and asks the text model a set of audience questions.
//! The analysis is shown once and never stored.

use axum::async_trait;
use tracing::info;

use super::layout::{escape, escape_attr, text_area, text_input};
use super::{report, FormInput, Page, PageId, PageOutcome};
use crate::error::PageError;
use crate::generation::prompts::{self, AudienceAnalysis, BusinessProfile, QUESTION_TOPICS};
use crate::generation::{GenerationError, TextRequest};
use crate::AppState;

/// Low temperature keeps the analysis close to the facts given
const ANALYSIS_TEMPERATURE: f32 = 0.1;

pub struct ClientInfoPage;

#[async_trait]
impl Page for ClientInfoPage {
    fn id(&self) -> PageId {
        PageId::ClientInfo
    }

    async fn render(&self, _state: &AppState, input: &FormInput) -> PageOutcome {
        PageOutcome::Render(profile_form(input, true, ""))
    }

    async fn handle_submit(&self, state: &AppState, input: &FormInput) -> PageOutcome {
        let action = input.action().unwrap_or("analyze");
        let result = match action {
            "analyze" => analyze(state, input).await,
            other => Err(PageError::InvalidInput(format!("Unknown action: {}", other))),
        };
        let below = match result {
            Ok(html) => html,
            Err(err) => report(self.id(), action, &err),
        };
        PageOutcome::Render(profile_form(input, false, &below))
    }
}

/// Selected predefined questions followed by custom ones, one per line
pub fn selected_questions(input: &FormInput) -> Vec<String> {
    let mut questions: Vec<String> = input.get_all("question").into_iter().map(str::to_string).collect();
    for line in input.value("custom_questions").lines() {
        let line = line.trim();
        if !line.is_empty() && !questions.iter().any(|q| q == line) {
            questions.push(line.to_string());
        }
    }
    questions
}

pub fn parse_profile(input: &FormInput) -> Result<BusinessProfile, PageError> {
    Ok(BusinessProfile {
        name: input.require("business_name", "Business name")?.to_string(),
        industry: input.require("industry", "Industry")?.to_string(),
        description: input.require("description", "Business description")?.to_string(),
    })
}

async fn analyze(state: &AppState, input: &FormInput) -> Result<String, PageError> {
    let profile = parse_profile(input)?;
    let questions = selected_questions(input);
    if questions.is_empty() {
        return Err(PageError::InvalidInput("Choose at least one question".to_string()));
    }

    let request = TextRequest::new(prompts::audience_prompt(&profile, &questions))
        .expecting_json()
        .with_temperature(ANALYSIS_TEMPERATURE);
    let reply = state
        .text
        .generate_text(&request)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let analysis = prompts::parse_audience_analysis(&reply, &questions)
        .map_err(GenerationError::ParseError)?;

    info!(
        industry = %profile.industry,
        questions = questions.len(),
        answered = analysis.answers.len(),
        "Generated audience analysis"
    );
    Ok(analysis_view(&profile, &analysis))
}

fn analysis_view(profile: &BusinessProfile, analysis: &AudienceAnalysis) -> String {
    let summary: String = analysis
        .summary
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape(p)))
        .collect();

    let topics: String = analysis
        .by_topic()
        .into_iter()
        .map(|(topic, answers)| {
            let items: String = answers
                .iter()
                .map(|a| {
                    format!(
                        "<dt>{}</dt><dd>{}</dd>",
                        escape(&a.question),
                        escape(&a.answer)
                    )
                })
                .collect();
            format!("<h3>{}</h3><dl>{}</dl>", escape(topic), items)
        })
        .collect();

    format!(
        "<section class=\"results\"><h2>Audience analysis: {}</h2>{}{}</section>",
        escape(&profile.name),
        summary,
        topics
    )
}

fn profile_form(input: &FormInput, first_visit: bool, below: &str) -> String {
    let chosen = input.get_all("question");
    let groups: String = QUESTION_TOPICS
        .iter()
        .map(|(topic, questions)| {
            let boxes: String = questions
                .iter()
                .map(|q| {
                    let checked = if first_visit || chosen.contains(q) { " checked" } else { "" };
                    format!(
                        "<label class=\"check\"><input type=\"checkbox\" name=\"question\" value=\"{}\"{}> {}</label>",
                        escape_attr(q),
                        checked,
                        escape(q)
                    )
                })
                .collect();
            format!("<fieldset><legend>{}</legend>{}</fieldset>", escape(topic), boxes)
        })
        .collect();

    format!(
        r#"<h1>{title}</h1>
<p class="muted">Describe the business and pick the audience questions to answer. Nothing on this page is saved.</p>
<form method="post" action="/client-info" class="panel">
<div class="grid">
{name}
{industry}
</div>
{description}
<h2>Questions</h2>
{groups}
{custom}
<button type="submit" name="action" value="analyze">Analyze audience</button>
</form>
{below}"#,
        title = PageId::ClientInfo.title(),
        name = text_input("business_name", "Business name", input.value("business_name"), ""),
        industry = text_input("industry", "Industry", input.value("industry"), "e.g. Skincare"),
        description = text_area("description", "Business description", input.value("description"), 4),
        groups = groups,
        custom = text_area(
            "custom_questions",
            "Custom questions (one per line)",
            input.value("custom_questions"),
            3
        ),
        below = below,
    )
}
