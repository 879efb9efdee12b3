#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end answering tests with wiremock standing in for the hosted
// embedding and chat-completion endpoints. No live network access.

use askdocs::answer::AnswerEngine;
use askdocs::config::ApiConfig;
use askdocs::embeddings::openai::OpenAiClient;
use askdocs::index::store::{ChunkRecord, VectorStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CANNED_ANSWER: &str = "The documents say apples grow on trees.";

fn stub_api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        ..ApiConfig::default()
    }
}

fn record(id: &str, vector: Vec<f32>, content: &str) -> ChunkRecord {
    ChunkRecord {
        id: id.to_string(),
        vector,
        content: content.to_string(),
        source: "fixture.docx".to_string(),
        chunk_index: 0,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

async fn seeded_store(index_dir: &std::path::Path) -> VectorStore {
    let mut store = VectorStore::create(index_dir)
        .await
        .expect("should create store");
    store
        .insert_batch(&[
            record("1", vec![1.0, 0.0, 0.0], "Apples grow on trees."),
            record("2", vec![0.0, 1.0, 0.0], "Bicycles have two wheels."),
        ])
        .await
        .expect("should seed store");
    store
}

async fn mount_embedding_stub(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [1.0, 0.0, 0.0], "index": 0}]
        })))
        .mount(server)
        .await;
}

fn chat_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": CANNED_ANSWER}}]
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_returns_the_templated_answer_from_canned_outputs() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let server = MockServer::start().await;

    mount_embedding_stub(&server).await;
    // The chat stub only matches when the prompt carries both the retrieved
    // context and the question, which pins the whole assembly path.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Apples grow on trees."))
        .and(body_string_contains("What do the documents say about apples?"))
        .respond_with(chat_response())
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store(&temp_dir.path().join("index")).await;
    let client = OpenAiClient::new(&stub_api_config(&server)).expect("should create client");
    let engine = AnswerEngine::new(store, client, 0.0);

    let answer = engine
        .ask("What do the documents say about apples?")
        .await
        .expect("ask should succeed");

    assert_eq!(answer, CANNED_ANSWER);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn retrieval_feeds_both_stored_chunks_into_the_context() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let server = MockServer::start().await;

    mount_embedding_stub(&server).await;
    // With only two stored chunks and k = 4, both must appear.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Apples grow on trees."))
        .and(body_string_contains("Bicycles have two wheels."))
        .respond_with(chat_response())
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store(&temp_dir.path().join("index")).await;
    let client = OpenAiClient::new(&stub_api_config(&server)).expect("should create client");
    let engine = AnswerEngine::new(store, client, 0.0);

    engine
        .ask("anything at all")
        .await
        .expect("ask should succeed");
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn a_failed_question_leaves_the_engine_usable() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let server = MockServer::start().await;

    mount_embedding_stub(&server).await;
    // First chat call fails, the next succeeds.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(chat_response())
        .mount(&server)
        .await;

    let store = seeded_store(&temp_dir.path().join("index")).await;
    let client = OpenAiClient::new(&stub_api_config(&server)).expect("should create client");
    let engine = AnswerEngine::new(store, client, 0.0);

    let first = engine.ask("first question").await;
    assert!(first.is_err(), "first call should fail");

    let second = engine
        .ask("second question")
        .await
        .expect("engine should stay usable after a failed question");
    assert_eq!(second, CANNED_ANSWER);
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_failure_is_fatal_to_the_request_only() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = seeded_store(&temp_dir.path().join("index")).await;
    let client = OpenAiClient::new(&stub_api_config(&server)).expect("should create client");
    let engine = AnswerEngine::new(store, client, 0.0);

    let result = engine.ask("a question").await;
    assert!(matches!(result, Err(askdocs::AskError::Query(_))));
}
