//! Generation client tests against a local mock upstream
//!
//! Each test serves canned responses from an axum router bound to an
//! ephemeral port and inspects what the client sent.

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use socialgen_common::models::{AspectRatio, ImageModel, ImageStyle};
use socialgen_common::ColorPalette;
use socialgen_studio::generation::{
    build_http_client, GeminiClient, GenerationError, IdeogramClient, ImageGenerator, ImageRequest,
    ReferenceImage, TextGenerator, TextRequest,
};

/// Requests seen by the mock: headers plus JSON body
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(HeaderMap, Value)>>>);

impl Captured {
    fn only(&self) -> (HeaderMap, Value) {
        let seen = self.0.lock().unwrap();
        assert_eq!(seen.len(), 1, "expected exactly one upstream request");
        seen[0].clone()
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Mock answering every JSON POST on `route` with a fixed reply
async fn mock_json(route: &str, status: StatusCode, reply: Value) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            route,
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        captured.0.lock().unwrap().push((headers, body));
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(captured.clone());
    (serve(app).await, captured)
}

fn gemini(base_url: &str) -> GeminiClient {
    GeminiClient::new(build_http_client(None).unwrap(), base_url, "gemini-test", "test-gemini-key")
}

fn ideogram(base_url: &str) -> IdeogramClient {
    IdeogramClient::new(build_http_client(None).unwrap(), base_url, "test-ideogram-key")
}

fn candidate(text: &str) -> Value {
    json!({"content": {"parts": [{"text": text}], "role": "model"}, "finishReason": "STOP"})
}

// =============================================================================
// Gemini
// =============================================================================

#[tokio::test]
async fn test_gemini_requests_variations_in_one_call() {
    let reply = json!({"candidates": [candidate("First"), candidate("  "), candidate("Third")]});
    let (base, captured) = mock_json("/v1beta/models/:call", StatusCode::OK, reply).await;

    let texts = gemini(&base)
        .generate_text(&TextRequest::new("Write a post").with_candidates(3))
        .await
        .unwrap();
    assert_eq!(texts, vec!["First", "Third"]);

    let (headers, body) = captured.only();
    assert_eq!(headers["x-goog-api-key"], "test-gemini-key");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Write a post");
    assert_eq!(body["generationConfig"]["candidateCount"], 3);
    assert!(body["generationConfig"].get("responseMimeType").is_none());
}

#[tokio::test]
async fn test_gemini_json_mode() {
    let reply = json!({"candidates": [candidate("{\"summary\": \"ok\"}")]});
    let (base, captured) = mock_json("/v1beta/models/:call", StatusCode::OK, reply).await;

    gemini(&base)
        .generate_text(&TextRequest::new("Analyze").expecting_json().with_temperature(0.5))
        .await
        .unwrap();

    let (_, body) = captured.only();
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["temperature"], 0.5);
}

#[tokio::test]
async fn test_gemini_error_carries_upstream_message() {
    let reply = json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}});
    let (base, _) = mock_json("/v1beta/models/:call", StatusCode::BAD_REQUEST, reply).await;

    let err = gemini(&base)
        .generate_text(&TextRequest::new("Write a post"))
        .await
        .unwrap_err();
    match err {
        GenerationError::ApiError(status, message) => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_blocked_prompt_is_empty_response() {
    let reply = json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}});
    let (base, _) = mock_json("/v1beta/models/:call", StatusCode::OK, reply).await;

    let err = gemini(&base)
        .generate_text(&TextRequest::new("Write a post"))
        .await
        .unwrap_err();
    assert!(matches!(&err, GenerationError::EmptyResponse(reason) if reason.contains("SAFETY")));
}

#[tokio::test]
async fn test_gemini_unreachable_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gemini(&format!("http://{}", addr))
        .generate_text(&TextRequest::new("Write a post"))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::NetworkError(_)));
}

// =============================================================================
// Ideogram
// =============================================================================

fn image_request(model: ImageModel) -> ImageRequest {
    ImageRequest {
        negative_prompt: Some("blurry".to_string()),
        aspect_ratio: AspectRatio::Landscape16x9,
        model,
        style: Some(ImageStyle::Design),
        color_palette: ColorPalette::parse("#ff5733 navy").unwrap(),
        num_images: 2,
        ..ImageRequest::new("A cat on a skateboard")
    }
}

#[tokio::test]
async fn test_ideogram_generate_payload_and_images() {
    let reply = json!({
        "created": "2024-01-01T00:00:00Z",
        "data": [
            {"url": "https://img/1.png", "resolution": "1312x736", "seed": 7, "is_image_safe": true},
            {"prompt": "no url here"},
            {"image_url": "https://img/2.png"}
        ]
    });
    let (base, captured) = mock_json("/generate", StatusCode::OK, reply).await;

    let artifact = ideogram(&base)
        .generate_image(&image_request(ImageModel::V2Turbo))
        .await
        .unwrap();
    let urls: Vec<&str> = artifact.images.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, vec!["https://img/1.png", "https://img/2.png"]);
    assert_eq!(artifact.images[0].seed, Some(7));
    assert_eq!(artifact.model, ImageModel::V2Turbo);

    let (headers, body) = captured.only();
    assert_eq!(headers["api-key"], "test-ideogram-key");
    let sent = &body["image_request"];
    assert_eq!(sent["prompt"], "A cat on a skateboard");
    assert_eq!(sent["aspect_ratio"], "ASPECT_16_9");
    assert_eq!(sent["model"], "V_2_TURBO");
    assert_eq!(sent["num_images"], 2);
    assert_eq!(sent["negative_prompt"], "blurry");
    assert_eq!(sent["style_type"], "DESIGN");
    assert_eq!(sent["color_palette"]["members"][0]["color_hex"], "#FF5733");
    assert_eq!(sent["color_palette"]["members"][0]["color_weight"], 1.0);
    assert_eq!(sent["color_palette"]["members"][1]["color_hex"], "#000080");
    assert!(sent.get("image_weight").is_none());
}

#[tokio::test]
async fn test_ideogram_v1_omits_style_and_palette() {
    let reply = json!({"data": [{"url": "https://img/1.png"}]});
    let (base, captured) = mock_json("/generate", StatusCode::OK, reply).await;

    ideogram(&base)
        .generate_image(&image_request(ImageModel::V1))
        .await
        .unwrap();

    let (_, body) = captured.only();
    assert_eq!(body["image_request"]["model"], "V_1");
    assert!(body["image_request"].get("style_type").is_none());
    assert!(body["image_request"].get("color_palette").is_none());
}

#[tokio::test]
async fn test_ideogram_no_urls_is_empty_response() {
    let (base, _) = mock_json("/generate", StatusCode::OK, json!({"data": []})).await;

    let err = ideogram(&base)
        .generate_image(&image_request(ImageModel::V2))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse(_)));
}

#[tokio::test]
async fn test_ideogram_error_status() {
    let (base, _) = mock_json("/generate", StatusCode::UNAUTHORIZED, json!({"message": "Invalid API key"})).await;

    let err = ideogram(&base)
        .generate_image(&image_request(ImageModel::V2))
        .await
        .unwrap_err();
    assert!(matches!(&err, GenerationError::ApiError(401, m) if m == "Invalid API key"));
}

/// Multipart fields seen by the mock: name, file name, content
#[derive(Clone, Default)]
struct Parts(Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>);

async fn mock_multipart(route: &str, reply: Value) -> (String, Parts) {
    let parts = Parts::default();
    let app = Router::new()
        .route(
            route,
            post(move |State(parts): State<Parts>, mut multipart: Multipart| {
                let reply = reply.clone();
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let bytes = field.bytes().await.unwrap().to_vec();
                        parts.0.lock().unwrap().push((name, file_name, bytes));
                    }
                    Json(reply)
                }
            }),
        )
        .with_state(parts.clone());
    (serve(app).await, parts)
}

fn reference() -> ReferenceImage {
    ReferenceImage {
        file_name: "mood.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[tokio::test]
async fn test_ideogram_remix_sends_multipart() {
    let (base, parts) = mock_multipart("/remix", json!({"data": [{"url": "https://img/remix.png"}]})).await;

    let request = ImageRequest {
        reference: Some(reference()),
        image_weight: 70,
        ..image_request(ImageModel::V2)
    };
    let artifact = ideogram(&base).generate_image(&request).await.unwrap();
    assert_eq!(artifact.images[0].url, "https://img/remix.png");

    let seen = parts.0.lock().unwrap().clone();
    let (_, _, request_json) = seen
        .iter()
        .find(|(name, _, _)| name == "image_request")
        .expect("image_request part");
    let sent: Value = serde_json::from_slice(request_json).unwrap();
    assert_eq!(sent["image_weight"], 70);
    assert_eq!(sent["prompt"], "A cat on a skateboard");

    let (_, file_name, bytes) = seen
        .iter()
        .find(|(name, _, _)| name == "image_file")
        .expect("image_file part");
    assert_eq!(file_name.as_deref(), Some("mood.png"));
    assert_eq!(bytes, &reference().bytes);
}

#[tokio::test]
async fn test_ideogram_describe() {
    let reply = json!({"descriptions": [{"text": " A sunny beach "}, {"text": ""}, {"text": "Palm trees"}]});
    let (base, parts) = mock_multipart("/describe", reply).await;

    let descriptions = ideogram(&base).describe_image(&reference()).await.unwrap();
    assert_eq!(descriptions, vec!["A sunny beach", "Palm trees"]);

    let seen = parts.0.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "image_file");
}
