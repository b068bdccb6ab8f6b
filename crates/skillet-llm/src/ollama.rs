use async_trait::async_trait;
use serde_json::{Value, json};
use skillet_core::{Message, MessageContent, Result, Role, SkilletError, ToolCall};
use std::time::Duration;
use tracing::{debug, info};

use crate::provider::*;

/// Ollama provider, talking to the native `/api/chat` endpoint with tool calling.
pub struct OllamaProvider {
    client: reqwest::Client,
    /// Address of the Ollama server (e.g. "http://127.0.0.1:11434")
    base_url: String,
    model_name: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_name: model_name.into(),
        }
    }

    /// Same as [`new`](Self::new) with a per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SkilletError::LlmProvider(format!("ollama client: {e}")))?;
        Ok(Self {
            client,
            ..Self::new(base_url, model_name)
        })
    }

    /// Default local Ollama instance
    pub fn local(model: &str) -> Self {
        Self::new("http://127.0.0.1:11434", model)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Models installed on the server, via `/api/tags`.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| SkilletError::LlmProvider(format!("ollama unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(SkilletError::LlmProvider(format!(
                "ollama /api/tags returned {}",
                resp.status()
            )));
        }
        let data: Value = resp
            .json()
            .await
            .map_err(|e| SkilletError::LlmProvider(e.to_string()))?;
        Ok(data["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Convert history into Ollama chat messages.
pub(crate) fn to_ollama_messages(system: Option<&str>, history: &[Message]) -> Vec<Value> {
    let mut messages = Vec::new();

    if let Some(system) = system {
        messages.push(json!({
            "role": "system",
            "content": system,
        }));
    }

    for msg in history {
        match msg.role {
            Role::Tool => {
                // One Ollama message per result block
                for block in &msg.content {
                    if let MessageContent::ToolResult {
                        tool_name, content, ..
                    } = block
                    {
                        messages.push(json!({
                            "role": "tool",
                            "tool_name": tool_name,
                            "content": content,
                        }));
                    }
                }
            }
            Role::Assistant => {
                let mut m = json!({
                    "role": "assistant",
                    "content": msg.text_content(),
                });
                if !msg.tool_calls.is_empty() {
                    m["tool_calls"] = msg
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "function": {
                                    "name": tc.tool_name,
                                    "arguments": tc.arguments,
                                }
                            })
                        })
                        .collect();
                }
                messages.push(m);
            }
            Role::System | Role::User => {
                let role = if msg.role == Role::System { "system" } else { "user" };
                messages.push(json!({
                    "role": role,
                    "content": msg.text_content(),
                }));
            }
        }
    }

    messages
}

/// Tool definitions in Ollama's function-calling shape.
pub(crate) fn to_ollama_tools(tools: &[skillet_core::Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

/// Parse `message.tool_calls` from a chat response. Ollama does not issue
/// call ids, so one is generated per call.
pub(crate) fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
    let Some(calls) = message["tool_calls"].as_array() else {
        return vec![];
    };
    calls
        .iter()
        .filter_map(|c| {
            let name = c["function"]["name"].as_str()?;
            // Some models emit arguments as a JSON string instead of an object
            let arguments = match &c["function"]["arguments"] {
                Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({})),
                Value::Null => json!({}),
                other => other.clone(),
            };
            Some(ToolCall {
                id: c["id"]
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4())),
                tool_name: name.to_string(),
                arguments,
            })
        })
        .collect()
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn models(&self) -> Vec<String> {
        vec![self.model_name.clone()]
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let mut body = json!({
            "model": &request.model,
            "messages": to_ollama_messages(request.system.as_deref(), &request.messages),
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(to_ollama_tools(&request.tools));
        }

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "ollama chat request"
        );

        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SkilletError::LlmProvider(format!("ollama: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            let text = resp.text().await.unwrap_or_default();
            if text.contains("not found") {
                return Err(SkilletError::ModelNotFound(request.model.clone()));
            }
            return Err(SkilletError::LlmProvider(format!("ollama error: {text}")));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SkilletError::LlmProvider(format!(
                "ollama error ({status}): {text}"
            )));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| SkilletError::LlmProvider(e.to_string()))?;

        if let Some(err) = data["error"].as_str() {
            return Err(SkilletError::LlmProvider(format!("ollama error: {err}")));
        }

        let content = data["message"]["content"].as_str().unwrap_or("").to_string();
        let tool_calls = parse_tool_calls(&data["message"]);
        let has_tool_calls = !tool_calls.is_empty();

        let stop_reason = if has_tool_calls {
            StopReason::ToolUse
        } else if data["done_reason"].as_str() == Some("length") {
            StopReason::MaxTokens
        } else {
            StopReason::EndTurn
        };

        Ok(LlmResponse {
            message: Message::assistant(content, tool_calls),
            usage: Usage {
                input_tokens: data["prompt_eval_count"].as_u64().unwrap_or(0) as u32,
                output_tokens: data["eval_count"].as_u64().unwrap_or(0) as u32,
            },
            has_tool_calls,
            stop_reason,
        })
    }

    async fn health_check(&self) -> Result<()> {
        info!(base_url = %self.base_url, "checking ollama health");
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| SkilletError::LlmProvider(format!("ollama unreachable: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SkilletError::LlmProvider("ollama server unhealthy".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillet_core::ToolResult;

    #[test]
    fn test_tool_messages_carry_tool_name() {
        let call = ToolCall {
            id: "call_1".into(),
            tool_name: "bash".into(),
            arguments: json!({"command": "ls"}),
        };
        let history = vec![
            Message::text(Role::User, "list files"),
            Message::assistant("", vec![call]),
            Message::tool_result("bash", &ToolResult::ok("call_1", "a.txt")),
        ];
        let msgs = to_ollama_messages(Some("sys"), &history);
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[2]["tool_calls"][0]["function"]["name"], "bash");
        assert_eq!(msgs[2]["tool_calls"][0]["function"]["arguments"]["command"], "ls");
        assert_eq!(msgs[3]["role"], "tool");
        assert_eq!(msgs[3]["tool_name"], "bash");
        assert_eq!(msgs[3]["content"], "a.txt");
    }

    #[test]
    fn test_parse_tool_calls_string_arguments() {
        let message = json!({
            "tool_calls": [
                {"function": {"name": "view_skill", "arguments": "{\"skill_id\":\"pdf\"}"}},
                {"function": {"arguments": {}}}
            ]
        });
        let calls = parse_tool_calls(&message);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].str_arg("skill_id"), Some("pdf"));
        assert!(calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_parse_tool_calls_absent() {
        assert!(parse_tool_calls(&json!({"content": "hi"})).is_empty());
    }
}
