//! Pipeline behaviour against a scripted completion client.
//!
//! No network, no pdfium: the fake client records every request it receives
//! and answers with a canned reply, so each test can assert both what came
//! out and whether (and with what) the remote service was called.

use async_trait::async_trait;
use essence_map::pipeline::extract::concat_page_texts;
use essence_map::pipeline::llm::ClientError;
use essence_map::{
    authorize, Completion, CompletionClient, CompletionRequest, DiagramSegment, DigestConfig,
    DigestPipeline, EssenceError, Submission,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SECRET: &str = "SKKU2026";

const MINDMAP_REPLY: &str = concat!(
    "1. Caching is just remembering answers you already paid for.\n",
    "2. Stale data is the price.\n",
    "3. Invalidation is where it hurts.\n",
    "\n",
    "```mermaid\n",
    "mindmap\n",
    "  root((Caching))\n",
    "    Remember\n",
    "    Stale\n",
    "```\n",
);

// ── Fake client ──────────────────────────────────────────────────────────────

enum Behaviour {
    Reply(String),
    Fail(String),
    Hang,
}

struct FakeClient {
    behaviour: Behaviour,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeClient {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn replying(reply: &str) -> Arc<Self> {
        Self::new(Behaviour::Reply(reply.to_string()))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> CompletionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("client was never called")
    }
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match &self.behaviour {
            Behaviour::Reply(content) => Ok(Completion {
                content: content.clone(),
                prompt_tokens: 42,
                completion_tokens: 7,
            }),
            Behaviour::Fail(msg) => Err(msg.clone().into()),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("the timeout fires first")
            }
        }
    }
}

fn pipeline_with(client: Arc<FakeClient>, config: DigestConfig) -> DigestPipeline {
    DigestPipeline::new(config, client)
}

fn default_config() -> DigestConfig {
    DigestConfig::builder().gate_secret(SECRET).build().unwrap()
}

// ── Gate ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn correct_code_and_text_yields_both_panels() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let output = pipeline
        .digest(Submission::new(SECRET).with_text("Caches trade memory for time."))
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert!(output.summary.starts_with("1. Caching"));
    assert!(output.summary.ends_with("where it hurts."));
    assert_eq!(
        output.diagram,
        DiagramSegment::Diagram("mindmap\n  root((Caching))\n    Remember\n    Stale".into())
    );
    assert_eq!(output.stats.prompt_tokens, 42);
    assert_eq!(output.stats.completion_tokens, 7);
    assert!(!output.stats.truncated);
}

#[tokio::test]
async fn wrong_code_never_reaches_the_service() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let err = pipeline
        .digest(Submission::new("skku2026").with_text("Real text."))
        .await
        .unwrap_err();

    assert!(matches!(err, EssenceError::Unauthorized));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn empty_code_is_reported_separately() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let err = pipeline
        .digest(Submission::new("").with_text("Real text."))
        .await
        .unwrap_err();

    assert!(matches!(err, EssenceError::MissingCode));
    assert_eq!(client.calls(), 0);
}

#[test]
fn gate_comparison_is_exact() {
    assert!(authorize(SECRET, SECRET));
    assert!(!authorize("skku2026", SECRET));
    assert!(!authorize(" SKKU2026", SECRET));
    assert!(!authorize("SKKU2026 ", SECRET));
}

// ── Input ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_is_rejected_before_anything_else() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    for submission in [
        Submission::new(SECRET),
        Submission::new(SECRET).with_text("   \n\t "),
        Submission::new("wrong").with_text(""),
    ] {
        let err = pipeline.digest(submission).await.unwrap_err();
        assert!(matches!(err, EssenceError::EmptyInput), "got {err:?}");
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn unreadable_document_fails_without_a_remote_call() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let err = pipeline
        .digest(Submission::new(SECRET).with_document(b"definitely not a pdf".to_vec()))
        .await
        .unwrap_err();

    assert!(matches!(err, EssenceError::DocumentParse { .. }), "got {err:?}");
    assert_eq!(client.calls(), 0);
}

#[test]
fn page_texts_concatenate_in_order_without_separator() {
    let pages = vec![Some("A".to_string()), Some("B".to_string()), Some("C".to_string())];
    assert_eq!(concat_page_texts(pages), "ABC");

    let with_blank = vec![Some("A".to_string()), None, Some("C".to_string())];
    assert_eq!(concat_page_texts(with_blank), "AC");
}

// ── Truncation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn long_input_is_cut_to_the_first_twelve_thousand_characters() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let text: String = "가".repeat(11_990) + &"x".repeat(30_010);
    let output = pipeline
        .digest(Submission::new(SECRET).with_text(text.clone()))
        .await
        .unwrap();

    let sent = client.last_request().user;
    assert_eq!(sent.chars().count(), 12_000);
    assert!(text.starts_with(&sent));
    assert!(output.stats.truncated);
    assert_eq!(output.stats.input_chars, 42_000);
    assert_eq!(output.stats.transmitted_chars, 12_000);
}

#[tokio::test]
async fn short_input_is_sent_verbatim_with_the_system_prompt() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    pipeline
        .digest(Submission::new(SECRET).with_text("Short lecture note."))
        .await
        .unwrap();

    let request = client.last_request();
    assert_eq!(request.user, "Short lecture note.");
    assert!(request.system.contains("```mermaid"));
}

// ── Reply split ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_without_delimiter_is_kept_whole() {
    let reply = "1. Caching is remembering.\n2. Mind map";
    let client = FakeClient::replying(reply);
    let pipeline = pipeline_with(client, default_config());

    let output = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap();

    assert_eq!(output.summary, reply);
    assert_eq!(output.diagram, DiagramSegment::NotProduced);
}

#[tokio::test]
async fn reply_without_delimiter_shows_summary_only() {
    let client = FakeClient::replying("Three points, but no map today.");
    let pipeline = pipeline_with(client.clone(), default_config());

    let output = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap();

    assert_eq!(output.summary, "Three points, but no map today.");
    assert_eq!(output.diagram, DiagramSegment::NotProduced);
}

#[tokio::test]
async fn only_the_first_delimiter_splits() {
    let reply = "Summary\n```mermaid\ngraph TD\n  A-->B\n```\nnote ```mermaid again";
    let client = FakeClient::replying(reply);
    let pipeline = pipeline_with(client.clone(), default_config());

    let output = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap();

    assert_eq!(output.summary, "Summary");
    assert_eq!(output.diagram.source(), Some("graph TD\n  A-->B"));
}

#[tokio::test]
async fn custom_delimiter_is_honoured() {
    let config = DigestConfig::builder()
        .gate_secret(SECRET)
        .delimiter("%%MAP%%")
        .build()
        .unwrap();
    let client = FakeClient::replying("Point one.\n%%MAP%%\n```mermaid\nmindmap\n  root\n```");
    let pipeline = pipeline_with(client.clone(), config);

    let output = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap();

    assert_eq!(output.summary, "Point one.");
    assert_eq!(output.diagram.source(), Some("mindmap\n  root"));
    assert!(client.last_request().system.contains("%%MAP%%"));
}

// ── Remote failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn remote_error_surfaces_without_partial_output() {
    let client = FakeClient::new(Behaviour::Fail("insufficient_quota".into()));
    let pipeline = pipeline_with(client.clone(), default_config());

    let err = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap_err();

    match err {
        EssenceError::RemoteCall { message } => assert!(message.contains("insufficient_quota")),
        other => panic!("expected RemoteCall, got {other:?}"),
    }
    assert_eq!(client.calls(), 1, "no retries");
}

#[tokio::test(start_paused = true)]
async fn hung_remote_call_times_out() {
    let config = DigestConfig::builder()
        .gate_secret(SECRET)
        .api_timeout_secs(5)
        .build()
        .unwrap();
    let client = FakeClient::new(Behaviour::Hang);
    let pipeline = pipeline_with(client.clone(), config);

    let err = pipeline
        .digest(Submission::new(SECRET).with_text("text"))
        .await
        .unwrap_err();

    assert!(matches!(err, EssenceError::RemoteTimeout { secs: 5 }));
    assert_eq!(client.calls(), 1);
}

// ── Independence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn submissions_do_not_influence_each_other() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = Arc::new(pipeline_with(client.clone(), default_config()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let code = if i % 2 == 0 { SECRET } else { "nope" };
                pipeline
                    .digest(Submission::new(code).with_text(format!("doc {i}")))
                    .await
            })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }

    assert_eq!(ok, 4);
    assert_eq!(client.calls(), 4);
    let mut sent: Vec<String> = client
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.user.clone())
        .collect();
    sent.sort();
    assert_eq!(sent, vec!["doc 0", "doc 2", "doc 4", "doc 6"]);
}

#[test]
fn sync_wrapper_runs_outside_a_runtime() {
    let client = FakeClient::replying(MINDMAP_REPLY);
    let pipeline = pipeline_with(client.clone(), default_config());

    let output = pipeline
        .digest_sync(Submission::new(SECRET).with_text("text"))
        .unwrap();
    assert!(output.diagram.is_produced());
}

#[test]
fn pipeline_config_is_readable_but_redacted() {
    let pipeline = pipeline_with(FakeClient::replying(MINDMAP_REPLY), default_config());

    assert_eq!(pipeline.config().max_input_chars, 12_000);
    let dbg = format!("{:?}", pipeline.config());
    assert!(!dbg.contains(SECRET));
}
