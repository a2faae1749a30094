use super::*;
use httpmock::prelude::*;
use serde_json::json;

fn test_client(base_url: &str) -> OllamaClient {
    let config = OllamaConfig {
        base_url: base_url.to_string(),
        ..OllamaConfig::default()
    };
    OllamaClient::new(&config)
        .expect("can build client")
        .with_retry_attempts(1)
        .with_timeout(Duration::from_secs(5))
}

#[test]
fn embed_batch_returns_vectors_in_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/embed")
            .json_body_includes(r#"{"model": "nomic-embed-text"}"#);
        then.status(200)
            .json_body(json!({ "embeddings": [[1.0, 0.0], [0.0, 1.0]] }));
    });

    let client = test_client(&server.base_url());
    let embeddings = client
        .embed_batch(&["first".to_string(), "second".to_string()])
        .expect("embed should succeed");

    mock.assert();
    assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[test]
fn embed_batch_skips_request_for_empty_input() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/embed");
        then.status(200).json_body(json!({ "embeddings": [] }));
    });

    let client = test_client(&server.base_url());
    let embeddings = client.embed_batch(&[]).expect("empty batch is a no-op");

    assert!(embeddings.is_empty());
    mock.assert_hits(0);
}

#[test]
fn embed_batch_rejects_count_mismatch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/embed");
        then.status(200).json_body(json!({ "embeddings": [[1.0]] }));
    });

    let client = test_client(&server.base_url());
    let result = client.embed_batch(&["a".to_string(), "b".to_string()]);

    assert!(matches!(result, Err(ChatError::Embedding(_))));
}

#[test]
fn embed_one_returns_single_vector() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/embed");
        then.status(200).json_body(json!({ "embeddings": [[0.5, 0.5]] }));
    });

    let client = test_client(&server.base_url());
    let vector = client.embed_one("question").expect("embed should succeed");
    assert_eq!(vector, vec![0.5, 0.5]);
}

#[test]
fn generate_returns_message_content() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/chat")
            .json_body_includes(r#"{"model": "llama3.2", "stream": false}"#);
        then.status(200).json_body(json!({
            "message": { "role": "assistant", "content": "Wireless Headphones were shipped." }
        }));
    });

    let client = test_client(&server.base_url());
    let answer = client
        .generate("ground your answer", "What was shipped?")
        .expect("generation should succeed");

    mock.assert();
    assert_eq!(answer, "Wireless Headphones were shipped.");
}

#[test]
fn client_error_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(404);
    });

    let client = test_client(&server.base_url()).with_retry_attempts(3);
    let result = client.generate("system", "user");

    assert!(matches!(result, Err(ChatError::Generation(_))));
    mock.assert_hits(1);
}

#[test]
fn server_error_is_retried_until_attempts_exhausted() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/embed");
        then.status(503);
    });

    let client = test_client(&server.base_url()).with_retry_attempts(2);
    let result = client.embed_batch(&["text".to_string()]);

    assert!(matches!(result, Err(ChatError::Embedding(_))));
    mock.assert_hits(2);
}

#[test]
fn ping_succeeds_against_live_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200).json_body(json!({ "models": [] }));
    });

    let client = test_client(&server.base_url());
    assert!(client.ping().is_ok());
}

#[test]
fn ping_fails_when_unreachable() {
    // Port 1 is reserved and should refuse connections
    let client = test_client("http://127.0.0.1:1");
    assert!(client.ping().is_err());
}
