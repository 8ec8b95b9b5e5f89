//! Shared page chrome and HTML helpers
//!
//! Pages are rendered server side as plain strings. Anything that came from
//! the user or from a generation API goes through [`escape`] or
//! [`escape_attr`] before it is interpolated.

use super::PageId;
use std::collections::BTreeMap;

/// Escape text content
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape a double-quoted attribute value
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Full HTML document around a page body
pub fn page_shell(active: Option<PageId>, title: &str, body: &str) -> String {
    let nav: String = PageId::ALL
        .iter()
        .map(|page| {
            let class = if Some(*page) == active { " class=\"active\"" } else { "" };
            format!(
                "<a href=\"/{slug}\"{class}>{label}</a>",
                slug = page.slug(),
                class = class,
                label = page.title()
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · SocialGen Studio</title>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <header>
        <div class="brand">SocialGen Studio</div>
        <nav>{nav}</nav>
    </header>
    <main>
{body}
    </main>
    <footer>v{version} [{git_hash}]</footer>
</body>
</html>"#,
        title = escape(title),
        nav = nav,
        body = body,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Error,
}

/// Inline message box
pub fn alert(kind: AlertKind, message: &str) -> String {
    let class = match kind {
        AlertKind::Info => "alert info",
        AlertKind::Success => "alert success",
        AlertKind::Error => "alert error",
    };
    format!("<div class=\"{}\" role=\"alert\">{}</div>", class, escape(message))
}

/// `<option>` list with one entry selected
pub fn options<'a, I>(choices: I, selected: Option<&str>) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    choices
        .into_iter()
        .map(|(value, label)| {
            let mark = if Some(value) == selected { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                escape_attr(value),
                mark,
                escape(label)
            )
        })
        .collect()
}

/// Labelled single-line text input
pub fn text_input(name: &str, label: &str, value: &str, placeholder: &str) -> String {
    format!(
        "<label>{label}<input type=\"text\" name=\"{name}\" value=\"{value}\" placeholder=\"{placeholder}\"></label>",
        label = escape(label),
        name = name,
        value = escape_attr(value),
        placeholder = escape_attr(placeholder),
    )
}

/// Labelled textarea
pub fn text_area(name: &str, label: &str, value: &str, rows: u8) -> String {
    format!(
        "<label>{label}<textarea name=\"{name}\" rows=\"{rows}\">{value}</textarea></label>",
        label = escape(label),
        name = name,
        rows = rows,
        value = escape(value),
    )
}

/// Hidden field
pub fn hidden(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        name,
        escape_attr(value)
    )
}

/// Horizontal bar chart of counts, largest first
///
/// Ties keep the map's (alphabetical) order.
pub fn bar_chart(title: &str, counts: &BTreeMap<String, i64>) -> String {
    if counts.is_empty() {
        return format!(
            "<section class=\"chart\"><h3>{}</h3><p class=\"muted\">No data yet.</p></section>",
            escape(title)
        );
    }

    let mut entries: Vec<(&String, &i64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    let max = entries.first().map(|(_, c)| **c).unwrap_or(1).max(1);

    let rows: String = entries
        .iter()
        .map(|(label, count)| {
            let width = (**count as f64 / max as f64 * 100.0).round();
            format!(
                "<div class=\"bar-row\"><span class=\"bar-label\">{label}</span>\
                 <span class=\"bar-track\"><span class=\"bar\" style=\"width: {width}%\"></span></span>\
                 <span class=\"bar-value\">{count}</span></div>",
                label = escape(label),
                width = width,
                count = count,
            )
        })
        .collect();

    format!(
        "<section class=\"chart\"><h3>{}</h3>{}</section>",
        escape(title),
        rows
    )
}
