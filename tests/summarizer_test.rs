use axum::{Json, Router, http::StatusCode, routing::post};
use doc_summary_backend::services::summarizer::{HttpSummarizer, Summarizer};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SUMMARY_PATH: &str = "/api/summary-pdf";

/// Serves `router` on an ephemeral port and returns the summary endpoint URL.
async fn spawn_summary_service(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}{}", addr, SUMMARY_PATH)
}

#[tokio::test]
async fn test_successful_summary_is_unwrapped() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();

    let router = Router::new().route(
        SUMMARY_PATH,
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                Json(json!({
                    "ResultDocName": "\"report.pdf\"",
                    "DecryptionKey": "a2V5",
                    "EncryptionInitialState": "aXY=",
                    "AuthTag": "dGFn"
                }))
            }
        }),
    );
    let url = spawn_summary_service(router).await;
    let summarizer = HttpSummarizer::new(url, Duration::from_secs(5)).unwrap();

    let result = summarizer
        .summarize("-----BEGIN PUBLIC KEY-----", "uploads/docs/report.pdf")
        .await;

    assert!(result.success);
    assert_eq!(result.result_location.as_deref(), Some("report.pdf"));
    assert_eq!(result.decryption_key.as_deref(), Some("a2V5"));
    assert_eq!(result.encryption_initial_state.as_deref(), Some("aXY="));
    assert_eq!(result.auth_tag.as_deref(), Some("dGFn"));
    assert!(result.error_message.is_none());

    let body = received.lock().unwrap().clone().expect("service was called");
    assert_eq!(body["PdfDocPath"], "uploads/docs/report.pdf");
    assert_eq!(body["PublicKeyPem"], "-----BEGIN PUBLIC KEY-----");
}

#[tokio::test]
async fn test_timeout_yields_empty_failure() {
    let router = Router::new().route(
        SUMMARY_PATH,
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "ResultDocName": "late.pdf" }))
        }),
    );
    let url = spawn_summary_service(router).await;
    let summarizer = HttpSummarizer::new(url, Duration::from_millis(200)).unwrap();

    let result = summarizer.summarize("pem", "uploads/docs/report.pdf").await;

    assert!(!result.success);
    assert!(result.timed_out);
    assert!(!result.has_content());
    assert!(result.result_location.is_none());
    assert!(result.decryption_key.is_none());
    assert!(result.encryption_initial_state.is_none());
    assert!(result.auth_tag.is_none());
}

#[tokio::test]
async fn test_error_status_yields_failure() {
    let router = Router::new().route(
        SUMMARY_PATH,
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
    );
    let url = spawn_summary_service(router).await;
    let summarizer = HttpSummarizer::new(url, Duration::from_secs(5)).unwrap();

    let result = summarizer.summarize("pem", "uploads/docs/report.pdf").await;

    assert!(!result.success);
    assert!(!result.timed_out);
    assert!(!result.has_content());
    let message = result.error_message.unwrap();
    assert!(message.contains("500"), "{message}");
}

#[tokio::test]
async fn test_undecodable_body_yields_failure() {
    let router = Router::new().route(SUMMARY_PATH, post(|| async { "not json" }));
    let url = spawn_summary_service(router).await;
    let summarizer = HttpSummarizer::new(url, Duration::from_secs(5)).unwrap();

    let result = summarizer.summarize("pem", "uploads/docs/report.pdf").await;

    assert!(!result.success);
    assert!(!result.has_content());
    assert!(result.error_message.unwrap().contains("decoded"));
}

#[tokio::test]
async fn test_unreachable_service_yields_failure() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let summarizer = HttpSummarizer::new(
        format!("http://{}{}", addr, SUMMARY_PATH),
        Duration::from_secs(2),
    )
    .unwrap();

    let result = summarizer.summarize("pem", "uploads/docs/report.pdf").await;

    assert!(!result.success);
    assert!(!result.has_content());
    assert!(result.error_message.is_some());
}
