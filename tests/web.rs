//! HTTP surface tests: the router is driven in-process with `oneshot`.

#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use essence_map::pipeline::llm::ClientError;
use essence_map::web::{router, DEFAULT_BODY_LIMIT};
use essence_map::{Completion, CompletionClient, CompletionRequest, DigestConfig, DigestPipeline};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "SKKU2026";
const BOUNDARY: &str = "essence-map-test-boundary";

struct CannedClient {
    reply: String,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            content: self.reply.clone(),
            ..Completion::default()
        })
    }
}

fn app(reply: &str) -> (axum::Router, Arc<CannedClient>) {
    let client = Arc::new(CannedClient {
        reply: reply.to_string(),
        calls: AtomicUsize::new(0),
    });
    let config = DigestConfig::builder().gate_secret(SECRET).build().unwrap();
    let pipeline = DigestPipeline::new(config, client.clone());
    (router(pipeline, DEFAULT_BODY_LIMIT), client)
}

/// Hand-built multipart body with text fields and an optional file part.
fn multipart(fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"notes.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_digest(app: axum::Router, body: Vec<u8>) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/digest")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn index_serves_the_form() {
    let (app, _) = app("unused");
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(html.contains(r#"action="/digest""#));
    assert!(html.contains(r#"name="code""#));
    assert!(!html.contains("{{ notice }}"));
}

#[tokio::test]
async fn healthz_answers_ok() {
    let (app, _) = app("unused");
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn good_submission_renders_both_panels() {
    let (app, client) = app("**Point one.**\n```mermaid\nmindmap\n  root((Essence))\n```");
    let body = multipart(&[("code", SECRET), ("text", "Some lecture notes.")], None);

    let (status, html) = post_digest(app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert!(html.contains("<strong>Point one.</strong>"));
    assert!(html.contains("<pre class=\"mermaid\">\nmindmap\n  root((Essence))\n</pre>"));
}

#[tokio::test]
async fn wrong_code_is_unauthorized_and_free() {
    let (app, client) = app("unused");
    let body = multipart(&[("code", "skku2026"), ("text", "Some lecture notes.")], None);

    let (status, html) = post_digest(app, body).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert!(html.contains("code is invalid"));
    assert!(!html.contains("class=\"mermaid\""));
}

#[tokio::test]
async fn empty_submission_is_unprocessable() {
    let (app, client) = app("unused");
    let body = multipart(&[("code", SECRET), ("text", "")], Some(&b""[..]));

    let (status, html) = post_digest(app, body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert!(html.contains("punch the air"));
}

#[tokio::test]
async fn reply_without_diagram_shows_the_notice() {
    let (app, _) = app("Just words, no map.");
    let body = multipart(&[("code", SECRET), ("text", "notes")], None);

    let (status, html) = post_digest(app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Just words, no map."));
    assert!(html.contains("No diagram was produced"));
}

#[tokio::test]
async fn non_multipart_post_is_rejected() {
    let (app, client) = app("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/digest")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}
