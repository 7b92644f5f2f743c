//! Router-level tests: requests go through the full middleware stack with
//! `tower::ServiceExt::oneshot`, against an in-memory table and a recording
//! mail transport.

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use doclink::{DocLink, Matcher, Record, RecordIndex};
use http_body_util::BodyExt;
use index::InMemoryBackend;
use serde_json::{json, Value};
use server::mail::{MailError, Mailer, OutgoingMail};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<(), MailError> {
        Err(MailError::Rejected {
            status: 503,
            body: "unavailable".into(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn records() -> Vec<Record> {
    vec![
        Record::new(
            "welcome",
            "Kindergarten Welcome Letter",
            "https://docs.example/welcome.pdf",
        ),
        Record::new("", "Unit 1 Flip Book", "https://docs.example/unit1.pdf"),
        Record::new("", "Unit 2 Flip Book", "https://docs.example/unit2.pdf"),
        Record::new("vowels", "Vowel Poster", "https://docs.example/vowel.pdf"),
    ]
}

fn doclink_of(rows: Vec<Record>) -> DocLink {
    let index = RecordIndex::new(Box::new(InMemoryBackend::new(rows)));
    index.reload().unwrap();
    DocLink::new(index, Matcher::default())
}

fn app_with(config: ServerConfig, doclink: DocLink, mailer: Arc<dyn Mailer>) -> Router {
    build_router(Arc::new(ServerState::with_parts(
        config, doclink, mailer, None,
    )))
}

fn app(mailer: Arc<dyn Mailer>) -> Router {
    app_with(ServerConfig::default(), doclink_of(records()), mailer)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn webhook_sends_matched_link() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf_name": "Vowel Poster", "email": "ana@example.org", "name": "Ana" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");
    assert_eq!(body["document"], "Vowel Poster");
    assert_eq!(body["link"], "https://docs.example/vowel.pdf");
    assert_eq!(body["source"], "display_name");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@example.org");
    assert!(sent[0].text.contains("Hi Ana"));
    assert!(sent[0].text.contains("https://docs.example/vowel.pdf"));
}

#[tokio::test]
async fn webhook_understands_wrapped_payloads() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/webhook",
            json!({
                "contact": { "email": "lee@example.org", "first_name": "Lee" },
                "customData": { "keyword": { "value": "Welcome letter for my class" } }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["document"], "Kindergarten Welcome Letter");
    assert_eq!(body["source"], "keyword_contained");
    assert_eq!(mailer.sent()[0].to, "lee@example.org");
}

#[tokio::test]
async fn ambiguous_query_is_not_found_and_sends_nothing() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf": "Flip Book", "email": "a@example.org", "name": "A" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["details"]["reason"], "ambiguous");
    assert_eq!(body["error"]["details"]["query"], "Flip Book");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn short_query_is_not_found() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf": "a-b", "email": "a@example.org", "name": "A" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"]["reason"], "query_too_short");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let app = app(Arc::new(RecordingMailer::default()));

    let (status, body) = send(
        &app,
        post_json("/api/v1/webhook", json!({ "pdf": "Vowel Poster", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("recipient email"));

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf": "Vowel Poster", "email": "not-an-address", "name": "A" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app(Arc::new(RecordingMailer::default()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhook")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let empty = Request::builder()
        .method("POST")
        .uri("/api/v1/webhook")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mail_failure_is_bad_gateway() {
    let app = app(Arc::new(FailingMailer));

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf": "Vowel Poster", "email": "a@example.org", "name": "A" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "MAIL_ERROR");
}

#[tokio::test]
async fn matched_row_without_link_sends_nothing() {
    let mailer = Arc::new(RecordingMailer::default());
    let mut rows = records();
    rows.push(Record::new("", "Grade 2 Consonant Chart", ""));
    let app = app_with(ServerConfig::default(), doclink_of(rows), mailer.clone());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/webhook",
            json!({ "pdf": "Grade 2 Consonant Chart", "email": "a@example.org", "name": "A" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "TABLE_ERROR");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn lookup_is_a_dry_run() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());

    let (status, body) = send(&app, get("/api/v1/lookup?q=Vowel%20Poster&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["normalized_query"], "vowel poster");
    assert_eq!(body["score"], 1000);
    assert_eq!(body["generation"], 1);
    let candidates = body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["display_name"], "Vowel Poster");

    let (status, body) = send(&app, get("/api/v1/lookup?q=zzzz%20qqqq")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], false);
    assert_eq!(body["outcome"], "below_threshold");
    assert_eq!(body["rejection"]["reason"], "below_threshold");

    let (status, _) = send(&app, get("/api/v1/lookup")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn api_keys_gate_protected_routes_only() {
    let mut config = ServerConfig::default();
    config.api_keys.insert("k1".to_string());
    let app = app_with(
        config,
        doclink_of(records()),
        Arc::new(RecordingMailer::default()),
    );

    let (status, body) = send(&app, get("/api/v1/table")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_FAILED");

    let request = Request::builder()
        .uri("/api/v1/table")
        .header("x-api-key", "k1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 4);

    let request = Request::builder()
        .uri("/api/v1/table")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_applies_per_key() {
    let mut config = ServerConfig::default();
    config.api_keys.insert("k1".to_string());
    config.rate_limit_per_minute = 1;
    let app = app_with(
        config,
        doclink_of(records()),
        Arc::new(RecordingMailer::default()),
    );

    let request = || {
        Request::builder()
            .uri("/api/v1/table")
            .header("x-api-key", "k1")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&app, request()).await.0, StatusCode::OK);
    let (status, body) = send(&app, request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn readiness_follows_table_contents() {
    let empty = app_with(
        ServerConfig::default(),
        doclink_of(Vec::new()),
        Arc::new(RecordingMailer::default()),
    );
    let (status, body) = send(&empty, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");

    let full = app(Arc::new(RecordingMailer::default()));
    let (status, body) = send(&full, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["table"]["records"], 4);
}

#[tokio::test]
async fn reload_swaps_in_new_csv_and_keeps_old_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.csv");
    std::fs::write(
        &path,
        "keyword,name,link\nvowels,Vowel Poster,https://docs.example/vowel.pdf\n",
    )
    .unwrap();

    let mut config = ServerConfig::default();
    config.table.path = Some(path.clone());
    let doclink = DocLink::from_config(&config.doclink_config()).unwrap();
    let app = app_with(config, doclink, Arc::new(RecordingMailer::default()));

    let (_, body) = send(&app, get("/api/v1/table")).await;
    assert_eq!(body["records"], 1);
    assert_eq!(body["generation"], 1);

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, ",Consonant Chart,https://docs.example/consonant.pdf").unwrap();
    drop(file);

    let (status, body) = send(&app, post_json("/api/v1/table/reload", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 2);
    assert_eq!(body["generation"], 2);

    let (_, body) = send(&app, get("/api/v1/lookup?q=consonant%20chart")).await;
    assert_eq!(body["document"], "Consonant Chart");

    std::fs::remove_file(&path).unwrap();
    let (status, body) = send(&app, post_json("/api/v1/table/reload", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "TABLE_ERROR");

    let (_, body) = send(&app, get("/api/v1/table")).await;
    assert_eq!(body["records"], 2);
    assert_eq!(body["generation"], 2);
}

#[tokio::test]
async fn unknown_route_and_request_id() {
    let app = app(Arc::new(RecordingMailer::default()));

    let request = Request::builder()
        .uri("/nope")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "doclink");
}
