//! Page controllers
//!
//! One controller per workflow. Routing resolves the URL slug to a
//! [`PageId`] and dispatches with a plain `match`; each controller is a
//! linear procedure: read form, validate, call one client, render.
//!
//! Controllers never fail the request. Errors are logged at the controller
//! boundary and rendered inline next to the form with a 200 response.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{PageError, RequestError};
use crate::generation::ReferenceImage;
use crate::AppState;

pub mod analytics;
pub mod client_info;
pub mod content;
pub mod images;
pub mod layout;

/// User-facing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    Content,
    Images,
    ClientInfo,
    Analytics,
}

impl PageId {
    pub const ALL: [PageId; 4] = [
        PageId::Content,
        PageId::Images,
        PageId::ClientInfo,
        PageId::Analytics,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PageId::Content => "content",
            PageId::Images => "images",
            PageId::ClientInfo => "client-info",
            PageId::Analytics => "analytics",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PageId::Content => "Content Generator",
            PageId::Images => "Image Creator",
            PageId::ClientInfo => "Client Information",
            PageId::Analytics => "Analytics",
        }
    }
}

impl FromStr for PageId {
    type Err = RequestError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|p| p.slug() == slug)
            .ok_or_else(|| RequestError::NotFound(slug.to_string()))
    }
}

/// What a controller hands back to the router
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Page body (without the shell), always sent with 200
    Render(String),
    /// 303 redirect
    Redirect(String),
}

/// Submitted fields and uploaded files
///
/// Built from the query string on GET and from the body on POST. Both
/// `application/x-www-form-urlencoded` and `multipart/form-data` bodies are
/// accepted; multipart file parts become [`ReferenceImage`]s.
#[derive(Debug, Clone, Default)]
pub struct FormInput {
    fields: Vec<(String, String)>,
    files: HashMap<String, ReferenceImage>,
}

impl FormInput {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            files: HashMap::new(),
        }
    }

    /// Replace every value of a field with one value
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.retain(|(k, _)| k != name);
        self.fields.push((name.to_string(), value.into()));
    }

    pub fn with_file(mut self, name: impl Into<String>, file: ReferenceImage) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    /// First value for a field, trimmed; blank values count as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Field value or empty string, for prefilling inputs
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Every non-blank value submitted under a name (checkbox groups)
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Required field
    pub fn require(&self, name: &str, label: &str) -> Result<&str, PageError> {
        self.get(name)
            .ok_or_else(|| PageError::InvalidInput(format!("{} is required", label)))
    }

    /// Optional field parsed with `FromStr`
    pub fn parse<T>(&self, name: &str, label: &str) -> Result<Option<T>, PageError>
    where
        T: FromStr,
    {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| PageError::InvalidInput(format!("{} is not valid: {}", label, raw))),
        }
    }

    pub fn action(&self) -> Option<&str> {
        self.get("action")
    }

    /// Uploaded file with content
    pub fn file(&self, name: &str) -> Option<&ReferenceImage> {
        self.files.get(name).filter(|f| !f.bytes.is_empty())
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| RequestError::BadRequest(e.body_text()))?;
            return Ok(FormInput::from_pairs(pairs));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| RequestError::BadRequest(e.body_text()))?;

        let mut input = FormInput::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| RequestError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| RequestError::BadRequest(e.body_text()))?;
                    input.files.insert(
                        name,
                        ReferenceImage {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| RequestError::BadRequest(e.body_text()))?;
                    input.fields.push((name, value));
                }
            }
        }
        Ok(input)
    }
}

/// Page controller
#[async_trait]
pub trait Page: Send + Sync {
    fn id(&self) -> PageId;

    /// Render the page for a GET request
    async fn render(&self, state: &AppState, input: &FormInput) -> PageOutcome;

    /// Handle a form submission
    async fn handle_submit(&self, state: &AppState, input: &FormInput) -> PageOutcome;
}

static CONTENT_PAGE: content::ContentPage = content::ContentPage;
static IMAGES_PAGE: images::ImagesPage = images::ImagesPage;
static CLIENT_INFO_PAGE: client_info::ClientInfoPage = client_info::ClientInfoPage;
static ANALYTICS_PAGE: analytics::AnalyticsPage = analytics::AnalyticsPage;

/// Controller for a page
pub fn page_for(id: PageId) -> &'static dyn Page {
    match id {
        PageId::Content => &CONTENT_PAGE,
        PageId::Images => &IMAGES_PAGE,
        PageId::ClientInfo => &CLIENT_INFO_PAGE,
        PageId::Analytics => &ANALYTICS_PAGE,
    }
}

/// Log a controller error and turn it into an inline message
pub(crate) fn report(page: PageId, action: &str, err: &PageError) -> String {
    if err.is_user_error() {
        info!(page = page.slug(), action, kind = err.kind(), error = %err, "Rejected form input");
    } else {
        warn!(page = page.slug(), action, kind = err.kind(), error = %err, "Page action failed");
    }
    layout::alert(layout::AlertKind::Error, &err.to_string())
}

fn respond(id: PageId, outcome: PageOutcome) -> Response {
    match outcome {
        PageOutcome::Render(body) => Html(layout::page_shell(Some(id), id.title(), &body)).into_response(),
        PageOutcome::Redirect(location) => Redirect::to(&location).into_response(),
    }
}

/// GET /:page
pub async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, RequestError> {
    let id: PageId = slug.parse()?;
    let input = FormInput::from_pairs(query);
    let outcome = page_for(id).render(&state, &input).await;
    Ok(respond(id, outcome))
}

/// POST /:page
pub async fn submit_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    input: FormInput,
) -> Result<Response, RequestError> {
    let id: PageId = slug.parse()?;
    let outcome = page_for(id).handle_submit(&state, &input).await;
    Ok(respond(id, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slugs_round_trip() {
        for page in PageId::ALL {
            assert_eq!(page.slug().parse::<PageId>().unwrap(), page);
            assert_eq!(page_for(page).id(), page);
        }
        assert!(matches!("settings".parse::<PageId>(), Err(RequestError::NotFound(_))));
    }

    #[test]
    fn test_form_input_accessors() {
        let input = FormInput::from_pairs([
            ("industry", "  Retail "),
            ("tone", "   "),
            ("question", "a"),
            ("question", ""),
            ("question", "b"),
        ]);
        assert_eq!(input.get("industry"), Some("Retail"));
        assert_eq!(input.get("tone"), None);
        assert_eq!(input.value("missing"), "");
        assert_eq!(input.get_all("question"), vec!["a", "b"]);
        assert!(input.require("tone", "Tone").is_err());
    }

    #[test]
    fn test_form_input_parse() {
        use socialgen_common::models::Platform;
        let input = FormInput::from_pairs([("platform", "tiktok"), ("bad", "myspace")]);
        assert_eq!(input.parse::<Platform>("platform", "Platform").unwrap(), Some(Platform::TikTok));
        assert_eq!(input.parse::<Platform>("absent", "Platform").unwrap(), None);
        assert!(input.parse::<Platform>("bad", "Platform").is_err());
    }

    #[test]
    fn test_empty_upload_is_absent() {
        let input = FormInput::default().with_file(
            "reference_image",
            ReferenceImage {
                file_name: "empty.png".into(),
                content_type: None,
                bytes: Vec::new(),
            },
        );
        assert!(input.file("reference_image").is_none());
    }
}
