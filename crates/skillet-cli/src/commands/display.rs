//! Terminal rendering of agent activity, and the approval prompt.

use async_trait::async_trait;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use serde_json::Value;
use skillet_runtime::{AgentCallback, ApprovalRequest, ApprovalResponse};
use tracing::{error, info, warn};

const RESULT_PREVIEW_CHARS: usize = 200;
const ARG_PREVIEW_CHARS: usize = 50;

/// Label for a stored conversation in the selector: `[YYYY-MM-DD HH:MM]  title`.
pub fn thread_label(updated_at: &str, title: &str) -> String {
    let stamp: String = updated_at.chars().take(16).collect();
    format!("[{stamp}]  {title}")
}

/// Keep the first `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Python-style `repr` of a JSON value: `True`, `None`, and strings quoted with
/// `'` unless they contain `'` but no `"`.
pub fn repr_value(value: &Value) -> String {
    match value {
        Value::String(s) => repr_str(s),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Null => "None".into(),
        Value::Array(items) => {
            let items: Vec<_> = items.iter().map(repr_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", repr_str(k), repr_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Number(n) => n.to_string(),
    }
}

fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr_value(other),
    }
}

/// One-line summary of a tool call, without colors. `None` for calls that are
/// not echoed (`bash` is shown by the approval prompt instead).
pub fn format_tool_call(tool_name: &str, arguments: &Value) -> Option<String> {
    if tool_name == "bash" {
        return None;
    }
    let args = arguments.as_object().filter(|m| !m.is_empty());
    Some(match args {
        None => tool_name.to_string(),
        Some(map) if map.len() == 1 => {
            let (_, value) = map.iter().next()?;
            format!("{tool_name}: {}", plain_value(value))
        }
        Some(map) => {
            let params = map
                .iter()
                .map(|(k, v)| {
                    let repr: String = repr_value(v).chars().take(ARG_PREVIEW_CHARS).collect();
                    format!("{k}={repr}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{tool_name}({params})")
        }
    })
}

/// Interactive callback for the terminal chat.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliCallback;

#[async_trait]
impl AgentCallback for CliCallback {
    async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalResponse {
        println!("\n\x1b[1mBash Command:\x1b[0m {}\n", request.command);

        let choice = tokio::task::spawn_blocking(|| {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Do you want to execute this command?")
                .items(["Yes", "No"])
                .default(0)
                .interact_opt()
        })
        .await;

        match choice {
            Ok(Ok(Some(0))) => ApprovalResponse::Approved,
            Ok(Ok(_)) => ApprovalResponse::Rejected,
            Ok(Err(e)) => {
                warn!(error = %e, "approval prompt failed, rejecting");
                ApprovalResponse::Rejected
            }
            Err(e) => {
                warn!(error = %e, "approval prompt panicked, rejecting");
                ApprovalResponse::Rejected
            }
        }
    }

    fn on_progress(&self, message: &str) {
        info!("{message}");
    }

    fn on_error(&self, message: &str) {
        error!("{message}");
    }

    fn on_tool_call(&self, tool_name: &str, arguments: &Value) {
        let Some(line) = format_tool_call(tool_name, arguments) else {
            return;
        };
        // bold the tool name, which always leads the line
        let rest = &line[tool_name.len()..];
        println!("\n\x1b[36m▶\x1b[0m \x1b[1m{tool_name}\x1b[0m{rest}");
    }

    fn on_tool_result(&self, _tool_name: &str, result: &str) {
        let shown = truncate_chars(result, RESULT_PREVIEW_CHARS);
        println!("\n\x1b[32m✓ Tool Result:\x1b[0m \x1b[90m{shown}\x1b[0m\n");
    }
}
