//! Gemini adapter tests against a local mock HTTP server.

use mockito::Matcher;
use symbiont::domain::models::ProposalContext;
use symbiont::domain::ports::{CodeGenerator, GeneratorError, SourceRepairer};
use symbiont::infrastructure::gemini::GeminiClient;

fn client(base_url: String) -> GeminiClient {
    GeminiClient::new(base_url, "test-model".to_string(), "test-key".to_string(), 5).unwrap()
}

fn context() -> ProposalContext {
    ProposalContext {
        source_context: "--- File: app/worker.py ---\nprint('hi')\n".to_string(),
        history_summary: "No history yet.".to_string(),
        user_request: None,
    }
}

fn body_with_text(text: &str) -> String {
    serde_json::json!({
        "candidates": [
            {"content": {"role": "model", "parts": [{"text": text}]}}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn propose_returns_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body_with_text(r#"{"filepath": "a.py", "content": "x", "description": "d"}"#))
        .create_async()
        .await;

    let raw = client(server.url()).propose(&context()).await.unwrap();
    assert!(raw.contains("\"filepath\""));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("quota exhausted")
        .create_async()
        .await;

    let err = client(server.url()).propose(&context()).await.unwrap_err();
    match err {
        GeneratorError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota exhausted"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_candidates_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let err = client(server.url()).propose(&context()).await.unwrap_err();
    assert!(matches!(err, GeneratorError::EmptyResponse));
}

#[tokio::test]
async fn repair_rewrites_source_with_fences_stripped() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body_with_text("```python\nprint('fixed')\n```"))
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("worker.py");
    tokio::fs::write(&source, "print('broken'\n").await.unwrap();

    client(server.url())
        .repair(&source, "SyntaxError: unexpected EOF")
        .await
        .unwrap();

    let rewritten = tokio::fs::read_to_string(&source).await.unwrap();
    assert_eq!(rewritten, "print('fixed')");
}
