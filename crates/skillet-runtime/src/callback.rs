use async_trait::async_trait;
use serde_json::Value;

use crate::hitl::{ApprovalRequest, ApprovalResponse};

/// Hooks through which a front end (CLI, tests, ...) observes and steers a run.
///
/// Only approval is mandatory; the display hooks default to doing nothing.
#[async_trait]
pub trait AgentCallback: Send + Sync {
    /// Decide whether an interrupting tool call may run.
    async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalResponse;

    fn on_progress(&self, _message: &str) {}

    fn on_error(&self, _error: &str) {}

    /// A tool is about to be called (before any approval prompt).
    fn on_tool_call(&self, _tool_name: &str, _arguments: &Value) {}

    fn on_tool_result(&self, _tool_name: &str, _result: &str) {}
}

/// Approves everything and displays nothing. Used by the data-analysis
/// subagent and by non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCallback;

#[async_trait]
impl AgentCallback for SilentCallback {
    async fn request_approval(&self, _request: &ApprovalRequest) -> ApprovalResponse {
        ApprovalResponse::Approved
    }
}
