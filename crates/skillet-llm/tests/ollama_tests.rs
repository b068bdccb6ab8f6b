use httpmock::prelude::*;
use serde_json::json;
use skillet_core::{Message, Role, SkilletError, Tool};
use skillet_llm::{LlmProvider, LlmRequest, OllamaProvider, StopReason};

fn request(tools: Vec<Tool>) -> LlmRequest {
    LlmRequest {
        model: "qwen3:8b".into(),
        messages: vec![Message::text(Role::User, "what skills do you have?")],
        tools,
        system: Some("You are helpful.".into()),
        max_tokens: 256,
        temperature: 0.0,
    }
}

fn view_skill_tool() -> Tool {
    Tool {
        name: "view_skill".into(),
        description: "Load a skill".into(),
        parameters: json!({"type": "object", "properties": {"skill_id": {"type": "string"}}}),
        is_mutating: false,
    }
}

#[tokio::test]
async fn test_complete_plain_text() {
    let server = MockServer::start_async().await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("\"stream\":false")
                .body_contains("You are helpful.");
            then.status(200).json_body(json!({
                "model": "qwen3:8b",
                "message": {"role": "assistant", "content": "I know about PDFs."},
                "done": true,
                "done_reason": "stop",
                "prompt_eval_count": 42,
                "eval_count": 7
            }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    let resp = provider.complete(&request(vec![])).await.unwrap();

    chat.assert_async().await;
    assert_eq!(resp.message.text_content(), "I know about PDFs.");
    assert_eq!(resp.stop_reason, StopReason::EndTurn);
    assert_eq!(resp.usage.input_tokens, 42);
    assert_eq!(resp.usage.total_tokens(), 49);
    assert!(!resp.has_tool_calls);
}

#[tokio::test]
async fn test_complete_with_tool_calls() {
    let server = MockServer::start_async().await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_contains("\"tools\"")
                .body_contains("view_skill");
            then.status(200).json_body(json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {"function": {"name": "view_skill", "arguments": {"skill_id": "pdf"}}}
                    ]
                },
                "done": true
            }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    let resp = provider.complete(&request(vec![view_skill_tool()])).await.unwrap();

    chat.assert_async().await;
    assert!(resp.has_tool_calls);
    assert_eq!(resp.stop_reason, StopReason::ToolUse);
    let call = &resp.message.tool_calls[0];
    assert_eq!(call.tool_name, "view_skill");
    assert_eq!(call.str_arg("skill_id"), Some("pdf"));
}

#[tokio::test]
async fn test_done_reason_length_is_max_tokens() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200).json_body(json!({
                "message": {"role": "assistant", "content": "truncat"},
                "done": true,
                "done_reason": "length"
            }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    let resp = provider.complete(&request(vec![])).await.unwrap();
    assert_eq!(resp.stop_reason, StopReason::MaxTokens);
}

#[tokio::test]
async fn test_missing_model_maps_to_model_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(404)
                .json_body(json!({"error": "model \"qwen3:8b\" not found, try pulling it first"}));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    let err = provider.complete(&request(vec![])).await.unwrap_err();
    assert!(matches!(err, SkilletError::ModelNotFound(m) if m == "qwen3:8b"));
}

#[tokio::test]
async fn test_server_error_is_provider_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(500).body("boom");
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    let err = provider.complete(&request(vec![])).await.unwrap_err();
    assert!(matches!(err, SkilletError::LlmProvider(ref m) if m.contains("boom")));
}

#[tokio::test]
async fn test_health_check_and_list_models() {
    let server = MockServer::start_async().await;
    let tags = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [{"name": "qwen3:8b"}, {"name": "llama3.2:latest"}]
            }));
        })
        .await;

    let provider = OllamaProvider::new(server.base_url(), "qwen3:8b");
    provider.health_check().await.unwrap();
    let models = provider.list_models().await.unwrap();

    assert_eq!(models, vec!["qwen3:8b".to_string(), "llama3.2:latest".to_string()]);
    tags.assert_hits_async(2).await;
}
