//! Gemini text generation client
//!
//! `POST {base}/v1beta/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header. Alternatives are requested through
//! `candidateCount` so several variations cost a single request.

use super::{api_error, GenerationError, TextGenerator, TextRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<Vec<String>, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("prompt is empty".to_string()));
        }

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                candidate_count: request.candidate_count.max(1),
                temperature: request.temperature,
                response_mime_type: request.json_response.then_some("application/json"),
            },
        };

        debug!(
            model = %self.model,
            candidates = request.candidate_count,
            prompt_chars = request.prompt.chars().count(),
            "Requesting Gemini completion"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %self.model, error = %e, "Gemini request failed");
                GenerationError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            warn!(model = %self.model, error = %err, "Gemini returned an error");
            return Err(err);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let texts = candidate_texts(&parsed);
        if texts.is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| parsed.candidates.iter().find_map(|c| c.finish_reason.clone()))
                .map(|r| format!("finish reason {}", r))
                .unwrap_or_else(|| "no candidates in response".to_string());
            warn!(model = %self.model, reason = %reason, "Gemini returned no text");
            return Err(GenerationError::EmptyResponse(reason));
        }

        info!(model = %self.model, variations = texts.len(), "Gemini completion received");
        Ok(texts)
    }
}

/// One string per candidate, parts concatenated, blank candidates skipped
fn candidate_texts(response: &GenerateContentResponse) -> Vec<String> {
    response
        .candidates
        .iter()
        .filter_map(|candidate| {
            let text: String = candidate
                .content
                .as_ref()?
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_candidate_texts_concatenates_parts() {
        let response = parse(
            r#"{"candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "  "}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "Second"}]}}
            ]}"#,
        );
        assert_eq!(candidate_texts(&response), vec!["Hello world", "Second"]);
    }

    #[test]
    fn test_candidate_texts_empty_when_blocked() {
        let response = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(candidate_texts(&response).is_empty());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                candidate_count: 3,
                temperature: None,
                response_mime_type: Some("application/json"),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["candidateCount"], 3);
        assert!(json["generationConfig"].get("temperature").is_none());
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_endpoint_format() {
        let client = GeminiClient::new(reqwest::Client::new(), "http://localhost:1/", "gemini-2.0-flash", "k");
        assert_eq!(
            client.endpoint(),
            "http://localhost:1/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
