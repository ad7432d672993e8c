//! Integration tests for the feed-photo endpoint.
//!
//! The router is driven through `tower::ServiceExt` without binding a port.
//! Workers AI (and the `OpenAI`-compatible backend) are replaced by an
//! in-process Axum server on `127.0.0.1:0`, so the real HTTP clients run.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use khulark_worker::{AppState, FeedPhotoService, WorkerConfig, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "khulark-test-boundary";

// ---------------------------------------------------------------------------
// Mock upstream
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(StatusCode, Value),
}

impl Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Json(body) => Json(body).into_response(),
            Self::Status(status, body) => (status, Json(body)).into_response(),
        }
    }
}

#[derive(Default)]
struct Calls {
    detection: Vec<Value>,
    llm: Vec<Value>,
    authorization: Vec<String>,
}

#[derive(Clone)]
struct Upstream {
    detection: Reply,
    llm: Reply,
    calls: Arc<Mutex<Calls>>,
}

async fn upstream(
    State(upstream): State<Upstream>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut calls = upstream.calls.lock().unwrap();
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        calls.authorization.push(auth.to_str().unwrap().to_owned());
    }

    if uri.path().contains("detr") {
        calls.detection.push(body);
        upstream.detection.into_response()
    } else {
        calls.llm.push(body);
        upstream.llm.into_response()
    }
}

/// Start a mock upstream and return its address and call log.
async fn spawn_upstream(detection: Reply, llm: Reply) -> (String, Arc<Mutex<Calls>>) {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let state = Upstream {
        detection,
        llm,
        calls: Arc::clone(&calls),
    };
    let app = Router::new().fallback(upstream).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}

fn detections(items: &[(&str, f64)]) -> Reply {
    let result: Vec<Value> = items
        .iter()
        .map(|(label, score)| {
            json!({
                "label": label,
                "score": score,
                "box": {"xmin": 10, "ymin": 20, "xmax": 200, "ymax": 180}
            })
        })
        .collect();
    Reply::Json(json!({"result": result, "success": true, "errors": []}))
}

fn llm_response(response: Value) -> Reply {
    Reply::Json(json!({"result": {"response": response}, "success": true, "errors": []}))
}

fn upstream_failure() -> Reply {
    Reply::Status(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"success": false, "errors": [{"code": 3001, "message": "Unknown internal error"}]}),
    )
}

// ---------------------------------------------------------------------------
// Worker under test
// ---------------------------------------------------------------------------

fn worker_router(base: &str, extra: &[(&str, String)]) -> Router {
    let mut vars = vec![
        ("CLOUDFLARE_ACCOUNT_ID", "acct".to_owned()),
        ("CLOUDFLARE_API_TOKEN", "token".to_owned()),
        ("CLOUDFLARE_API_BASE", format!("{base}/client/v4")),
    ];
    vars.extend(extra.iter().cloned());

    let config = WorkerConfig::from_lookup(|name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    })
    .unwrap();
    let service = FeedPhotoService::from_config(&config).unwrap();
    build_router(Arc::new(AppState::new(service, config.max_upload_bytes)))
}

async fn worker(detection: Reply, llm: Reply) -> (Router, Arc<Mutex<Calls>>) {
    let (base, calls) = spawn_upstream(detection, llm).await;
    (worker_router(&base, &[]), calls)
}

/// A multipart body with one part named `name`, a file part when
/// `file_name` is set.
fn multipart(name: &str, file_name: Option<&str>, data: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match file_name {
        Some(file_name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        ),
    }
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn feed_request(body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/feed-photo")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

fn photo() -> Body {
    multipart("image", Some("photo.jpg"), &[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4])
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn assert_decision(body: &Value, hunger: f64, affection: f64, sanity: f64) {
    assert_eq!(body["hunger"].as_f64(), Some(hunger), "body: {body}");
    assert_eq!(body["affection"].as_f64(), Some(affection), "body: {body}");
    assert_eq!(body["sanity"].as_f64(), Some(sanity), "body: {body}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn photo_of_food_gets_the_model_decision() {
    let (router, calls) = worker(
        detections(&[("pizza", 0.97), ("dining table", 0.31)]),
        llm_response(json!({
            "hunger": 25,
            "affection": 15,
            "sanity": 5,
            "speech": "Cheesy triangle! My favourite.",
            "alertText": "The khulark inhales the pizza."
        })),
    )
    .await;

    let (status, headers, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_decision(&body, 25.0, 15.0, 5.0);
    assert_eq!(body["speech"], "Cheesy triangle! My favourite.");
    assert_eq!(body["alertText"], "The khulark inhales the pizza.");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.detection.len(), 1);
    assert_eq!(calls.detection[0]["image"].as_array().map(Vec::len), Some(8));
    assert_eq!(calls.detection[0]["image"][0], 0xFF);
    assert!(calls.authorization.iter().all(|auth| auth == "Bearer token"));

    assert_eq!(calls.llm.len(), 1);
    let messages = &calls.llm[0]["messages"];
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains("pizza"));
    assert!(!system.contains("dining table"), "low-score label leaked into the prompt");
    assert_eq!(messages[1]["content"], "What do you eat from this photo?");
}

#[tokio::test]
async fn out_of_range_model_output_is_clamped() {
    let long_speech = "nom ".repeat(60);
    let (router, _) = worker(
        detections(&[("cake", 0.9)]),
        llm_response(json!({
            "hunger": 99,
            "affection": "-45",
            "sanity": 12.5,
            "speech": long_speech,
            "alertText": null
        })),
    )
    .await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 30.0, -20.0, 12.5);
    assert_eq!(body["speech"].as_str().unwrap().chars().count(), 100);
    assert_eq!(body["alertText"], "");
}

#[tokio::test]
async fn json_embedded_in_model_text_is_used() {
    let (router, _) = worker(
        detections(&[("sock", 0.88)]),
        llm_response(json!(
            "Hmm, let me think.\n```json\n{\"hunger\": -6, \"affection\": -2, \"sanity\": -8, \"speech\": \"Fuzzy. Wrong.\", \"alertText\": \"The khulark gags on the sock.\",}\n```"
        )),
    )
    .await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, -6.0, -2.0, -8.0);
    assert_eq!(body["speech"], "Fuzzy. Wrong.");
}

#[tokio::test]
async fn detection_failure_answers_fixed_fallback() {
    let (router, calls) = worker(upstream_failure(), llm_response(json!({"hunger": 30}))).await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 0.0, -5.0, -10.0);
    assert!(!body["speech"].as_str().unwrap().is_empty());
    assert!(calls.lock().unwrap().llm.is_empty(), "LLM called after detection failed");
}

#[tokio::test]
async fn non_json_model_text_answers_fixed_fallback() {
    let (router, _) = worker(
        detections(&[("laptop", 0.93)]),
        llm_response(json!("I would rather not eat that, thank you.")),
    )
    .await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 0.0, -5.0, -10.0);
}

#[tokio::test]
async fn model_failure_with_food_in_view_answers_delicious() {
    let (router, _) = worker(
        detections(&[("Sandwich", 0.81), ("cup", 0.77)]),
        upstream_failure(),
    )
    .await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 20.0, 10.0, 5.0);
    assert_eq!(body["speech"], "Thank you! This looks delicious.");
}

#[tokio::test]
async fn empty_detection_still_asks_the_model() {
    let (router, calls) = worker(
        detections(&[]),
        llm_response(json!({
            "hunger": 1, "affection": 0, "sanity": -1,
            "speech": "Just air?", "alertText": "The khulark licks the air."
        })),
    )
    .await;

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 1.0, 0.0, -1.0);
    let calls = calls.lock().unwrap();
    let system = calls.llm[0]["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("cannot make out any particular object"));
}

#[tokio::test]
async fn openai_compatible_backend_is_used_when_configured() {
    let (base, calls) = spawn_upstream(
        detections(&[("banana", 0.9)]),
        Reply::Json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"hunger\": 14, \"affection\": 6, \"sanity\": 2, \"speech\": \"Curvy snack!\", \"alertText\": \"The khulark peels and eats.\"}"}}]
        })),
    )
    .await;
    let router = worker_router(
        &base,
        &[
            ("LLM_BACKEND", "openai".to_owned()),
            ("LLM_API_URL", format!("{base}/v1")),
            ("LLM_API_KEY", "sk-test".to_owned()),
            ("LLM_MODEL", "gpt-4o-mini".to_owned()),
        ],
    );

    let (status, _, body) = send(router, feed_request(photo())).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 14.0, 6.0, 2.0);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.llm[0]["model"], "gpt-4o-mini");
    assert!(calls.authorization.contains(&"Bearer sk-test".to_owned()));
}

#[tokio::test]
async fn missing_image_part_is_a_bad_request() {
    let (router, calls) = worker(detections(&[]), llm_response(json!({}))).await;

    let (status, _, body) = send(
        router,
        feed_request(multipart("photo", Some("photo.jpg"), b"jpeg")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
    assert_eq!(body["status"], 400);
    assert!(calls.lock().unwrap().detection.is_empty());
}

#[tokio::test]
async fn text_or_empty_image_part_is_a_bad_request() {
    let (router, _) = worker(detections(&[]), llm_response(json!({}))).await;

    let (status, _, _) = send(
        router.clone(),
        feed_request(multipart("image", None, b"not a file")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(router, feed_request(multipart("image", Some("photo.jpg"), b""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_part_cut_off_mid_stream_answers_fixed_fallback() {
    let (router, calls) = worker(detections(&[("pizza", 0.9)]), llm_response(json!({}))).await;

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4]);

    let (status, _, body) = send(router, feed_request(Body::from(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_decision(&body, 0.0, -5.0, -10.0);
    assert!(calls.lock().unwrap().detection.is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_a_bad_request() {
    let (router, _) = worker(detections(&[]), llm_response(json!({}))).await;

    let request = Request::builder()
        .method("POST")
        .uri("/feed-photo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image": "data:image/jpeg;base64,AAAA"}"#))
        .unwrap();
    let (status, _, body) = send(router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let (base, calls) = spawn_upstream(detections(&[]), llm_response(json!({}))).await;
    let router = worker_router(&base, &[("MAX_UPLOAD_BYTES", "256".to_owned())]);

    let (status, _, body) = send(
        router,
        feed_request(multipart("image", Some("photo.jpg"), &[7_u8; 4096])),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "Image too large");
    assert!(calls.lock().unwrap().detection.is_empty());
}

#[tokio::test]
async fn preflight_allows_cross_origin_posts() {
    let (router, _) = worker(detections(&[]), llm_response(json!({}))).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/feed-photo")
        .header(header::ORIGIN, "https://khulark.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.eq_ignore_ascii_case("content-type"));
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (router, _) = worker(detections(&[]), llm_response(json!({}))).await;

    let request = Request::builder()
        .method("GET")
        .uri("/feed")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not Found", "status": 404}));
}
