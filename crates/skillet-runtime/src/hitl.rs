//! Human-in-the-loop approval for selected tools.
//!
//! Tools named in an [`InterruptPolicy`] pause the agent before they run. The
//! agent asks its [`AgentCallback`](crate::AgentCallback) for a decision; a
//! rejection is fed back to the model as an error result and the loop goes on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skillet_core::{ToolCall, ToolResult};
use std::collections::BTreeSet;

/// Shown when a call to an interrupting tool has no `command` argument.
pub const UNKNOWN_COMMAND: &str = "Unknown Command";

/// Which tools require a human decision before running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptPolicy {
    interrupt_on: BTreeSet<String>,
}

impl InterruptPolicy {
    pub fn new<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interrupt_on: tools.into_iter().map(Into::into).collect(),
        }
    }

    /// Never interrupt.
    pub fn none() -> Self {
        Self::default()
    }

    /// Interrupt on `bash` only.
    pub fn bash_only() -> Self {
        Self::new(["bash"])
    }

    pub fn requires_approval(&self, tool_name: &str) -> bool {
        self.interrupt_on.contains(tool_name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.interrupt_on.iter().map(String::as_str)
    }
}

/// What the human is asked to approve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub tool_call_id: String,
    pub tool_name: String,
    pub arguments: Value,
    /// Display string: the `command` argument if present.
    pub command: String,
}

impl ApprovalRequest {
    pub fn from_call(call: &ToolCall) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.tool_name.clone(),
            arguments: call.arguments.clone(),
            command: call
                .str_arg("command")
                .unwrap_or(UNKNOWN_COMMAND)
                .to_string(),
        }
    }

    /// Error result handed to the model when the call is rejected.
    pub fn rejection(&self) -> ToolResult {
        ToolResult::error(
            &self.tool_call_id,
            format!("User rejected the tool call for `{}`.", self.tool_name),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalResponse {
    Approved,
    Rejected,
}

impl From<bool> for ApprovalResponse {
    fn from(approved: bool) -> Self {
        if approved {
            ApprovalResponse::Approved
        } else {
            ApprovalResponse::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_membership() {
        let policy = InterruptPolicy::bash_only();
        assert!(policy.requires_approval("bash"));
        assert!(!policy.requires_approval("glob_search"));
        assert!(!InterruptPolicy::none().requires_approval("bash"));
    }

    #[test]
    fn request_uses_command_argument() {
        let call = ToolCall {
            id: "c1".into(),
            tool_name: "bash".into(),
            arguments: json!({"command": "rm -rf build"}),
        };
        let req = ApprovalRequest::from_call(&call);
        assert_eq!(req.command, "rm -rf build");

        let rejected = req.rejection();
        assert!(rejected.is_error);
        assert_eq!(rejected.content, "User rejected the tool call for `bash`.");
        assert_eq!(rejected.tool_call_id, "c1");
    }

    #[test]
    fn request_without_command() {
        let call = ToolCall {
            id: "c1".into(),
            tool_name: "deploy".into(),
            arguments: json!({"target": "prod"}),
        };
        assert_eq!(ApprovalRequest::from_call(&call).command, UNKNOWN_COMMAND);
    }
}
