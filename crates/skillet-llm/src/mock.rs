//! Scripted provider for agent tests.
//!
//! Each queued [`Turn`] answers one `complete` call, in order. Every request is
//! recorded so tests can check the prompt, history and tool list the agent sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::provider::*;
use skillet_core::{Message, Result, SkilletError, ToolCall};

/// Reply given once the script runs out.
pub const EXHAUSTED_REPLY: &str = "(mock: script exhausted)";

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum Turn {
    Reply { text: String, tool_calls: Vec<ToolCall> },
    Fail(String),
}

#[derive(Default)]
struct Script {
    turns: VecDeque<Turn>,
    next_call: usize,
}

/// # Example
/// ```
/// use skillet_llm::mock::MockProvider;
/// let provider = MockProvider::new("test")
///     .with_tool_call("view_skill", serde_json::json!({"skill_id": "pdf"}))
///     .with_response("Done.");
/// assert_eq!(provider.remaining(), 2);
/// ```
pub struct MockProvider {
    name: String,
    script: Mutex<Script>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(Script::default()),
            requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Queue a final answer.
    pub fn with_response(self, text: &str) -> Self {
        self.with_tool_calls(text, vec![])
    }

    /// Queue a turn that calls a single tool.
    pub fn with_tool_call(self, name: &str, args: Value) -> Self {
        self.with_tool_calls("", vec![(name, args)])
    }

    /// Queue a turn with optional text and any number of tool calls. Call ids
    /// are `call_1`, `call_2`, ... across the whole script.
    pub fn with_tool_calls(self, text: &str, calls: Vec<(&str, Value)>) -> Self {
        {
            let mut script = self.script.lock();
            let tool_calls = calls
                .into_iter()
                .map(|(name, arguments)| {
                    script.next_call += 1;
                    ToolCall {
                        id: format!("call_{}", script.next_call),
                        tool_name: name.to_string(),
                        arguments,
                    }
                })
                .collect();
            script.turns.push_back(Turn::Reply {
                text: text.to_string(),
                tool_calls,
            });
        }
        self
    }

    /// Queue a failed call.
    pub fn with_error(self, error: &str) -> Self {
        self.script.lock().turns.push_back(Turn::Fail(error.to_string()));
        self
    }

    /// Shared handle to every request received so far. Grab it before moving
    /// the provider into an agent.
    pub fn recorded_requests(&self) -> Arc<Mutex<Vec<LlmRequest>>> {
        Arc::clone(&self.requests)
    }

    /// Turns not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().turns.len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> Vec<String> {
        vec!["mock".to_string()]
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request.clone());
        let turn = self.script.lock().turns.pop_front();

        let (text, tool_calls) = match turn {
            Some(Turn::Reply { text, tool_calls }) => (text, tool_calls),
            Some(Turn::Fail(error)) => return Err(SkilletError::LlmProvider(error)),
            None => (EXHAUSTED_REPLY.to_string(), vec![]),
        };

        let has_tool_calls = !tool_calls.is_empty();
        Ok(LlmResponse {
            message: Message::assistant(text, tool_calls),
            usage: Usage {
                input_tokens: 100,
                output_tokens: 50,
            },
            has_tool_calls,
            stop_reason: if has_tool_calls {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            },
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillet_core::Role;

    fn request(system: Option<&str>) -> LlmRequest {
        LlmRequest {
            model: "qwen3:8b".into(),
            messages: vec![Message::text(Role::User, "hi")],
            tools: vec![],
            system: system.map(String::from),
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn script_plays_in_order_then_runs_dry() {
        let provider = MockProvider::new("mock")
            .with_tool_call("glob_search", json!({"pattern": "*.md"}))
            .with_response("Found it.");

        let first = provider.complete(&request(None)).await.unwrap();
        assert!(first.has_tool_calls);
        assert_eq!(first.stop_reason, StopReason::ToolUse);
        assert_eq!(first.message.tool_calls[0].tool_name, "glob_search");

        let second = provider.complete(&request(None)).await.unwrap();
        assert_eq!(second.message.text_content(), "Found it.");
        assert_eq!(second.stop_reason, StopReason::EndTurn);
        assert_eq!(provider.remaining(), 0);

        let dry = provider.complete(&request(None)).await.unwrap();
        assert_eq!(dry.message.text_content(), EXHAUSTED_REPLY);
    }

    #[tokio::test]
    async fn call_ids_are_numbered_across_turns() {
        let provider = MockProvider::new("mock")
            .with_tool_calls(
                "Checking two things",
                vec![
                    ("view_skill", json!({"skill_id": "pdf"})),
                    ("bash", json!({"command": "ls"})),
                ],
            )
            .with_tool_call("bash", json!({"command": "pwd"}));

        let turn = provider.complete(&request(None)).await.unwrap();
        let ids: Vec<_> = turn.message.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["call_1", "call_2"]);
        assert_eq!(turn.message.text_content(), "Checking two things");

        let next = provider.complete(&request(None)).await.unwrap();
        assert_eq!(next.message.tool_calls[0].id, "call_3");
    }

    #[tokio::test]
    async fn failure_turn_is_a_provider_error() {
        let provider = MockProvider::new("mock").with_error("connection refused");
        let err = provider.complete(&request(None)).await.unwrap_err();
        assert!(matches!(err, SkilletError::LlmProvider(ref m) if m == "connection refused"));
    }

    #[tokio::test]
    async fn requests_are_recorded_through_the_shared_handle() {
        let provider = MockProvider::new("mock").with_response("ok");
        let recorded = provider.recorded_requests();
        let llm: Arc<dyn LlmProvider> = Arc::new(provider);

        llm.complete(&request(Some("You are helpful."))).await.unwrap();

        let recorded = recorded.lock();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].system.as_deref(), Some("You are helpful."));
        assert_eq!(recorded[0].messages[0].text_content(), "hi");
    }
}
