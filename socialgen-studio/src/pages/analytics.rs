//! Analytics page
//!
//! Read-only view over saved content: totals, one bar chart per aggregate
//! dimension, the most used hashtags and the most recent records. An
//! optional platform filter narrows everything on the page.

use axum::async_trait;
use socialgen_common::models::{AggregateDimension, ContentFilter, ContentRecord, Platform};
use std::collections::{BTreeMap, HashMap};

use super::layout::{alert, bar_chart, escape, options, AlertKind};
use super::{report, FormInput, Page, PageId, PageOutcome};
use crate::error::PageError;
use crate::generation::prompts::extract_hashtags;
use crate::AppState;

/// Recent records listed under the charts
pub const RECENT_LIMIT: i64 = 20;

/// Characters of the body shown in the recent list
const PREVIEW_CHARS: usize = 120;

/// Bars in the hashtag chart
pub const TOP_HASHTAGS: usize = 10;

pub struct AnalyticsPage;

#[async_trait]
impl Page for AnalyticsPage {
    fn id(&self) -> PageId {
        PageId::Analytics
    }

    async fn render(&self, state: &AppState, input: &FormInput) -> PageOutcome {
        PageOutcome::Render(dashboard(state, input).await)
    }

    async fn handle_submit(&self, state: &AppState, input: &FormInput) -> PageOutcome {
        PageOutcome::Render(dashboard(state, input).await)
    }
}

/// Platform filter from the form; blank or "All" means no filter
pub fn parse_filter(input: &FormInput) -> Result<ContentFilter, PageError> {
    match input.get("platform") {
        None => Ok(ContentFilter::default()),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(ContentFilter::default()),
        Some(raw) => Ok(ContentFilter::platform(raw.parse::<Platform>()?)),
    }
}

async fn dashboard(state: &AppState, input: &FormInput) -> String {
    let mut notice = String::new();
    if let Some(id) = input.get("saved") {
        notice.push_str(&alert(AlertKind::Success, &format!("Saved content #{}", id)));
    }

    let body = match load(state, input).await {
        Ok(html) => html,
        Err(err) => report(PageId::Analytics, "load", &err),
    };

    format!(
        r#"<h1>{title}</h1>
{notice}
{filter}
{body}"#,
        title = PageId::Analytics.title(),
        notice = notice,
        filter = filter_form(input.get("platform")),
        body = body,
    )
}

async fn load(state: &AppState, input: &FormInput) -> Result<String, PageError> {
    let filter = parse_filter(input)?;

    let total = state.store.count(&filter).await?;
    if total == 0 {
        return Ok(alert(
            AlertKind::Info,
            "No saved content yet. Generate and save some content to see analytics.",
        ));
    }

    let mut charts = String::new();
    for dimension in AggregateDimension::ALL {
        let counts = state.store.aggregate_filtered(dimension, &filter).await?;
        charts.push_str(&bar_chart(&format!("By {}", dimension.label().to_lowercase()), &counts));
    }

    let records = state.store.list(&filter).await?;
    charts.push_str(&bar_chart("Top hashtags", &top_hashtags(&records, TOP_HASHTAGS)));

    let recent = &records[..records.len().min(RECENT_LIMIT as usize)];

    Ok(format!(
        r#"<p class="stat"><strong>{total}</strong> saved item{plural}</p>
<div class="charts">{charts}</div>
<h2>Recent content</h2>
{table}"#,
        total = total,
        plural = if total == 1 { "" } else { "s" },
        charts = charts,
        table = recent_table(recent),
    ))
}

/// Most used hashtags across record bodies, lowercased
///
/// A tag counts once per record. Ties are broken alphabetically before the
/// list is cut to `limit`.
pub fn top_hashtags(records: &[ContentRecord], limit: usize) -> BTreeMap<String, i64> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for record in records {
        for tag in extract_hashtags(&record.body) {
            *counts.entry(tag.to_lowercase()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, i64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().collect()
}

fn preview(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn recent_table(records: &[ContentRecord]) -> String {
    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{id}</td><td>{created}</td><td>{platform}</td><td>{content_type}</td>\
                 <td>{industry}</td><td>{tone}</td><td>{body}</td></tr>",
                id = r.id,
                created = socialgen_common::time::display(&r.created_at),
                platform = r.platform,
                content_type = r.content_type,
                industry = escape(&r.industry),
                tone = escape(&r.tone),
                body = escape(&preview(&r.body)),
            )
        })
        .collect();

    format!(
        "<table class=\"records\"><thead><tr><th>#</th><th>Created</th><th>Platform</th>\
         <th>Type</th><th>Industry</th><th>Tone</th><th>Content</th></tr></thead>\
         <tbody>{}</tbody></table>",
        rows
    )
}

fn filter_form(selected: Option<&str>) -> String {
    let choices = std::iter::once(("All", "All platforms"))
        .chain(Platform::ALL.iter().map(|p| (p.as_str(), p.as_str())));
    format!(
        r#"<form method="get" action="/analytics" class="panel inline">
<label>Platform<select name="platform">{}</select></label>
<button type="submit">Apply</button>
</form>"#,
        options(choices, Some(selected.unwrap_or("All")))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter(&FormInput::default()).unwrap(), ContentFilter::default());
        assert_eq!(
            parse_filter(&FormInput::from_pairs([("platform", "All")])).unwrap(),
            ContentFilter::default()
        );
        assert_eq!(
            parse_filter(&FormInput::from_pairs([("platform", "tiktok")])).unwrap(),
            ContentFilter::platform(Platform::TikTok)
        );
        assert!(parse_filter(&FormInput::from_pairs([("platform", "myspace")])).is_err());
    }

    fn record(id: i64, body: &str) -> ContentRecord {
        let now = socialgen_common::time::now();
        ContentRecord {
            id,
            platform: Platform::Instagram,
            content_type: socialgen_common::models::ContentType::Post,
            industry: "Coffee".to_string(),
            tone: "Friendly".to_string(),
            body: body.to_string(),
            additional_context: None,
            created_at: now,
            updated_at: None,
        }
    }

    #[test]
    fn test_top_hashtags_counts_records() {
        let records = vec![
            record(1, "Morning #Coffee #latte"),
            record(2, "#coffee again #COFFEE and #beans"),
            record(3, "Cold brew #coffee #beans #2024"),
            record(4, "No tags at all"),
        ];
        let top = top_hashtags(&records, TOP_HASHTAGS);
        let expected: BTreeMap<String, i64> = [("#coffee", 3), ("#beans", 2), ("#latte", 1)]
            .into_iter()
            .map(|(t, n)| (t.to_string(), n))
            .collect();
        assert_eq!(top, expected);
    }

    #[test]
    fn test_top_hashtags_keeps_limit() {
        let records: Vec<ContentRecord> = (0..12)
            .map(|i| {
                let tags: String = (0..=i).map(|j| format!(" #tag{:02}", j)).collect();
                record(i, &tags)
            })
            .collect();
        let top = top_hashtags(&records, TOP_HASHTAGS);
        assert_eq!(top.len(), TOP_HASHTAGS);
        assert_eq!(top["#tag00"], 12);
        assert_eq!(top["#tag09"], 3);
        assert!(!top.contains_key("#tag10"));

        let tied = vec![record(1, "#b #a #c")];
        let top = top_hashtags(&tied, 2);
        assert_eq!(top.keys().collect::<Vec<_>>(), vec!["#a", "#b"]);
    }

    #[test]
    fn test_preview_truncates_long_bodies() {
        assert_eq!(preview("short\n\nbody"), "short body");
        let long = "word ".repeat(100);
        let shown = preview(&long);
        assert!(shown.ends_with('…'));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_filter_form_selects_all_by_default() {
        let html = filter_form(None);
        assert!(html.contains("<option value=\"All\" selected>"));
    }
}
