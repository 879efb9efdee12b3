use super::*;
use crate::config::ApiConfig;

fn test_api_config() -> ApiConfig {
    ApiConfig {
        base_url: "http://localhost:9999/v1/".to_string(),
        embedding_model: "test-embed".to_string(),
        chat_model: "test-chat".to_string(),
        temperature: 0.0,
        batch_size: 8,
        api_key: Some("sk-test".to_string()),
    }
}

#[test]
fn client_configuration() {
    let client = OpenAiClient::new(&test_api_config()).expect("Failed to create client");

    assert_eq!(client.embeddings_url, "http://localhost:9999/v1/embeddings");
    assert_eq!(client.chat_url, "http://localhost:9999/v1/chat/completions");
    assert_eq!(client.auth_header, "Bearer sk-test");
    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.chat_model, "test-chat");
    assert_eq!(client.batch_size, 8);
}

#[test]
fn client_requires_an_api_key() {
    let config = ApiConfig {
        api_key: None,
        ..test_api_config()
    };

    assert!(OpenAiClient::new(&config).is_err());
}

#[test]
fn embeddings_response_is_sorted_by_index() {
    let body = r#"{
        "data": [
            {"embedding": [0.3, 0.3], "index": 1},
            {"embedding": [0.1, 0.1], "index": 0}
        ]
    }"#;

    let embeddings = parse_embeddings_response(body, 2).expect("parse should succeed");

    assert_eq!(embeddings[0], vec![0.1, 0.1]);
    assert_eq!(embeddings[1], vec![0.3, 0.3]);
}

#[test]
fn embeddings_count_mismatch_is_an_error() {
    let body = r#"{"data": [{"embedding": [0.1], "index": 0}]}"#;

    assert!(parse_embeddings_response(body, 2).is_err());
}

#[test]
fn chat_response_returns_first_choice_content() {
    let body = r#"{
        "choices": [
            {"message": {"role": "assistant", "content": "The answer."}}
        ]
    }"#;

    let answer = parse_chat_response(body).expect("parse should succeed");
    assert_eq!(answer, "The answer.");
}

#[test]
fn chat_response_without_choices_is_an_error() {
    assert!(parse_chat_response(r#"{"choices": []}"#).is_err());
}
